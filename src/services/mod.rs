pub mod aggregate;
pub mod profiles;
pub mod seawater;
pub mod series;
pub mod stations;

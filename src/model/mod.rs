pub mod arima;
pub mod error;
mod linalg;
pub mod stationarity;
pub mod trained;
pub mod trainer;

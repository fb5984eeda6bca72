pub mod forecast_point;
pub mod history;
pub mod period;
pub mod variable;

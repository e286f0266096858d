pub mod params;
pub mod schema;
pub mod steps;

pub use params::{ParamDef, Params};
pub use schema::{OnFailure, RetryConfig, Script, SessionConfig, Viewport};
pub use steps::Step;

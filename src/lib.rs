
pub mod mat;
pub mod model;
pub mod observed;
pub mod simulated;

pub mod landfall;
pub mod overlay;
pub mod reconcile;
pub mod session;

pub mod error;
pub mod gauge;
pub mod series;

pub mod constants;
pub mod parameters;
pub mod utils;

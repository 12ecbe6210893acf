//! Handlers 模块

pub mod alerts;
pub mod controls;
pub mod electrical;
pub mod health;
pub mod hub;
pub mod metrics;
pub mod plugins;
pub mod positions;
pub mod settings;
pub mod tanks;

pub use alerts::*;
pub use controls::*;
pub use electrical::*;
pub use health::*;
pub use hub::*;
pub use metrics::*;
pub use plugins::*;
pub use positions::*;
pub use settings::*;
pub use tanks::*;

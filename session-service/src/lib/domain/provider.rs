pub mod deadline;
pub mod local;
pub mod models;
pub mod ports;
pub mod registry;
pub mod revoking;

//! Runtime module — process lifecycle: boot and the task driver.

pub mod boot;
pub mod run;

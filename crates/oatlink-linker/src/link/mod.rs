//! Whole-batch linking: reservation, bss layout, and the write pass.

mod driver;
mod plan;
mod report;


pub use driver::{LinkedCode, link, link_with_provider};
pub use plan::{ExternalMethod, LinkPlan, PlannedMethod};
pub use report::render_report;

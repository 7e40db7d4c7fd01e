mod probe;
mod scheduler;
mod site;

pub use probe::{Probe, ProbeError};
pub use scheduler::{Registration, Scheduler, SchedulerError};
pub use site::{CheckReport, Site, SiteStatus, StatusRecord};

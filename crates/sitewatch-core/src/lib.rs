#![forbid(unsafe_code)]

pub mod config;
pub mod monitor;
pub mod notifier;
pub mod notify;

pub use config::ClientConfig;
pub use monitor::{
    CheckReport, Probe, ProbeError, Registration, Scheduler, SchedulerError, Site, SiteStatus,
    StatusRecord,
};
pub use notifier::{
    Notifier, NotifierConfig, NotifierError, NotifierRepository, NotifierService,
    StaticNotifierRepository,
};
pub use notify::{DeliveryError, Hub, Observer, SlackNotifier, State};

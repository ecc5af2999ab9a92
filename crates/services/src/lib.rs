#![forbid(unsafe_code)]

pub mod app_services;
pub mod config;
pub mod error;
pub mod gateway;
pub mod navigator;
pub mod sessions;
pub mod sync;
pub mod timer;

pub use testset_core::Clock;

pub use app_services::AppServices;
pub use config::GatewayConfig;
pub use error::{AppServicesError, GatewayError, NavigationError, SessionError};
pub use gateway::{HttpSubmissionGateway, SubmissionGateway};
pub use navigator::{ItemLink, ItemNavigator, Progress};
pub use sessions::{
    ItemClick, RunnerCommand, RunnerHandle, SessionRunner, SessionSnapshot, SubmitReason,
    TestSetSession, TestSetTakingService, TickOutcome,
};
pub use sync::{CrossContextSync, SkipReason, SyncOutcome, SyncTrigger};
pub use timer::{TICK_INTERVAL, TimerController, TimerTick};

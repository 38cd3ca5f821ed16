#![cfg_attr(not(test), forbid(unsafe_code))]
#![cfg_attr(test, deny(unsafe_code))]

pub mod account_service;
pub mod app_services;
pub mod config;
pub mod dashboard_service;
pub mod error;
pub mod game_service;
pub mod lesson_content;
pub mod lesson_service;
pub mod play;
pub mod progress_service;
pub mod score_service;

pub use learn_core::Clock;

pub use account_service::AccountService;
pub use app_services::AppServices;
pub use config::AppConfig;
pub use dashboard_service::{Activity, ActivityKind, Dashboard, DashboardService, DashboardStats};
pub use error::{
    AccountError, AppServicesError, ConfigError, GameServiceError, LessonServiceError,
    ProgressError, ScoreServiceError,
};
pub use game_service::GameService;
pub use lesson_service::LessonService;
pub use play::{DriverError, MemoryDriver, QuizDriver};
pub use progress_service::ProgressService;
pub use score_service::ScoreService;

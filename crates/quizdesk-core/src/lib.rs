//! quizdesk core
//!
//! Client-side state of the tutoring platform admin console: training
//! composition, catalog tree, pool search and drafts, EGE table validation,
//! backup time conversion, restore progress, caches and token storage.

pub mod backup;
pub mod catalog;
pub mod composer;
pub mod config;
pub mod ege;
pub mod error;
pub mod model;
pub mod pool;
pub mod progress;
pub mod session;
pub mod stats;
pub mod store;
pub mod tags;
pub mod upload;

pub use backup::{
    format_size, BackupSettings, BackupSettingsForm, BackupTime, RemoteBackup,
    RemoteRestoreRequest,
};
pub use catalog::{available_count, Catalog, CatalogTree, CreatedTopic, NewTopic, Topic, TopicTag};
pub use composer::{
    default_training_name, HardFilter, TagVocabulary, TopicSelection, DEFAULT_HARD_COUNT,
    DEFAULT_SUGGESTION_LIMIT, MIN_HARD_TAGS,
};
pub use config::Config;
pub use ege::{EgeRow, EgeTable, EgeUpdate, EGE_RANGE};
pub use error::{CoreError, Result};
pub use model::{
    filter_users, CreateTrainingRequest, CreatedTraining, HandWork, ImportResult, LoginRequest,
    LoginResponse, MessageResponse, OkResponse, RenameUser, SendTrainingRequest, TrainingMode,
    User,
};
pub use pool::{
    CreatedQuestion, DraftField, ImageSlot, NewQuestion, NewQuestionForm, PoolIndex, Question,
    QuestionDraft, QuestionSummary, QuestionType, QuestionUpdate, SearchPage, Selection,
    MARK_RANGE,
};
pub use progress::{NoProgress, ProgressSink, RestorePhase, RestoreProgress};
pub use session::TokenStore;
pub use stats::{
    format_duration, format_timestamp, image_url, parse_timestamp, work_type_label, ImageKind,
    Outcome, WorkDetail, WorkDetailGeneral, WorkDetailQuestion, WorkStat,
};
pub use store::{CacheKey, CacheStore, Cached};
pub use tags::{normalize_tag, normalize_tags, parse_tag_lines};
pub use upload::{UploadFile, UploadKind};

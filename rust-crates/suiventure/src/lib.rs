pub mod actions;
pub mod chain;
pub mod config;
pub mod detection;
pub mod items;
pub mod orchestrator;
pub mod progress;
pub mod snapshot;
pub mod tile_log;

pub use actions::Action;
pub use chain::{
    ChainError,
    Confirmation,
    MoveCall,
    ObjectId,
    StateSource,
    SuiAddress,
    TransactionExecutor,
};
pub use detection::{
    InferredEvent,
    classify,
};
pub use orchestrator::{
    ActionOrchestrator,
    ActionReport,
    OrchestratorError,
    Presentation,
    StateRefresh,
};
pub use snapshot::{
    PlayerSnapshot,
    RunObject,
    RunSnapshot,
};
pub use tile_log::TileEventLog;

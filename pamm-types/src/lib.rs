pub mod constants;
pub mod error;
pub mod event;
pub mod time;
pub mod validator;

pub use error::PammError;
pub use event::{AmmEvent, EventKind};
pub use time::TimeWindow;
pub use validator::{
    ClientMapping, ClientType, FetchOutcome, RankedValidator, ValidatorMetadata, ValidatorStats,
};

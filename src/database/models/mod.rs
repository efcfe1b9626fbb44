pub mod account;
pub mod contract;
pub mod mission;
pub mod payment;

pub use account::{Account, Provisioned};
pub use contract::Contract;
pub use mission::{Mission, MissionChanges, MissionDependents, MissionDetail, MissionStatus, NewMission};
pub use payment::Payment;

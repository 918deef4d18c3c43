//! Core data model.
//!
//! A work order is one booked engagement between a client and a worker for a
//! profession. Worker profiles carry rate and reputation; reviews close the
//! loop once an order is paid.

use serde::{Deserialize, Serialize};

pub mod identity;
pub mod location;
pub mod profession;
pub mod review;
pub mod work_order;
pub mod worker;

pub use identity::{Identity, Role};
pub use location::{Address, Coordinates};
pub use profession::Profession;
pub use review::{NewReview, Review};
pub use work_order::{NewBooking, NewWorkOrder, PaymentStatus, Status, WorkOrder};
pub use worker::{NewWorkerProfile, WorkerProfile};

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Declares an integer-keyed newtype id.
macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(
    /// A registered user, client or worker.
    UserId
);
id_type!(
    /// A service category.
    ProfessionId
);
id_type!(
    /// A booked engagement.
    WorkOrderId
);
id_type!(ReviewId);
id_type!(WorkerProfileId);

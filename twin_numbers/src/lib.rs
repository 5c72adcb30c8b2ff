/*!
Detection of "twin number" ballot anomalies in two-ballot elections.

Each area publishes a constituency (MP) result and a party-list (PL) result.
The twin party of an area is the party whose ballot number equals the ballot
number of the constituency winner. A twin party that ranks high in the party
list while the winner belongs to another party is flagged, and the flagged
areas are rolled up by province and by winning party.

The crate does no I/O. Callers feed [`AreaResults`] to a [`TwinDetector`],
hand the [`Detection`] to [`aggregate()`], and feed every document to a
[`NationwideTally`] for the nationwide group statistics.

See the [manual] for the input conventions and the meaning of the outputs.
*/

pub mod aggregate;
pub mod codes;
mod config;
pub mod detector;
pub mod manual;
pub mod nationwide;

pub use crate::aggregate::{aggregate, AnomalyReport};
pub use crate::config::*;
pub use crate::detector::{AreaOutcome, Detection, TwinDetector};
pub use crate::nationwide::NationwideTally;

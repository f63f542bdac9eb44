pub mod audit;
pub mod categories;
pub mod fsops;
pub mod ledger;
pub mod organizer;
pub mod paths;
pub mod util;
pub mod warn;
pub mod week;

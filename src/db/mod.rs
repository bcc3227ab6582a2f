pub mod catalogdb;
pub mod db;
pub mod jobdb;
pub mod memory;
pub mod messagedb;
pub mod userdb;

use catalogdb::CatalogExt;
use jobdb::JobExt;
use messagedb::MessageExt;
use userdb::UserExt;

/// Everything the job engine needs from persistence.
pub trait Store: JobExt + MessageExt + CatalogExt + UserExt + Send + Sync + std::fmt::Debug {}

impl<T> Store for T where T: JobExt + MessageExt + CatalogExt + UserExt + Send + Sync + std::fmt::Debug {}

//! Record-type strategies
//!
//! | Kind      | Strategy                  | Update            |
//! |-----------|---------------------------|-------------------|
//! | A/AAAA/TXT| [`GenericRecordStrategy`] | diff              |
//! | MX/NS     | [`PriorityRecordStrategy`]| diff              |
//! | SRV       | [`SrvRecordStrategy`]     | diff              |
//! | CAA       | [`CaaRecordStrategy`]     | diff              |
//! | CNAME     | [`CnameRecordStrategy`]   | wholesale replace |
//! | dns_record| [`LegacyRecordStrategy`]  | unsupported       |

pub mod caa;
pub mod cname;
pub mod generic;
pub mod legacy;
pub mod operations;
pub mod priority;
pub mod srv;

use std::sync::Arc;

use crate::resource::ResourceKind;
use crate::traits::RecordStrategy;

pub use caa::CaaRecordStrategy;
pub use cname::CnameRecordStrategy;
pub use generic::GenericRecordStrategy;
pub use legacy::LegacyRecordStrategy;
pub use priority::PriorityRecordStrategy;
pub use srv::SrvRecordStrategy;

/// Built-in strategy for a resource kind
pub fn default_strategy(kind: ResourceKind) -> Arc<dyn RecordStrategy> {
    match kind {
        ResourceKind::A => Arc::new(GenericRecordStrategy::a()),
        ResourceKind::Aaaa => Arc::new(GenericRecordStrategy::aaaa()),
        ResourceKind::Txt => Arc::new(GenericRecordStrategy::txt()),
        ResourceKind::Cname => Arc::new(CnameRecordStrategy::new()),
        ResourceKind::Mx => Arc::new(PriorityRecordStrategy::mx()),
        ResourceKind::Ns => Arc::new(PriorityRecordStrategy::ns()),
        ResourceKind::Srv => Arc::new(SrvRecordStrategy::new()),
        ResourceKind::Caa => Arc::new(CaaRecordStrategy::new()),
        ResourceKind::DnsRecord => Arc::new(LegacyRecordStrategy::new()),
    }
}

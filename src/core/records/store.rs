use async_trait::async_trait;

use super::{BackendError, Repository};
use crate::audits::{Audit, AuditFinding};
use crate::directory::{Profile, UserRole};
use crate::documents::Document;
use crate::kpis::{Kpi, KpiValue};
use crate::nonconformities::{CorrectiveAction, NonConformity};
use crate::processes::Process;
use crate::risks::Risk;
use crate::training::{TrainingAttendance, TrainingProgram, TrainingSession};

/// Every repository the application needs, behind one object.
#[async_trait]
pub trait RecordStore:
    Repository<Profile>
    + Repository<UserRole>
    + Repository<Document>
    + Repository<Process>
    + Repository<NonConformity>
    + Repository<CorrectiveAction>
    + Repository<Audit>
    + Repository<AuditFinding>
    + Repository<Kpi>
    + Repository<KpiValue>
    + Repository<Risk>
    + Repository<TrainingProgram>
    + Repository<TrainingSession>
    + Repository<TrainingAttendance>
    + Send
    + Sync
{
    fn backend_name(&self) -> &'static str;

    async fn health(&self) -> Result<(), BackendError>;
}

#[async_trait]
impl RecordStore for super::MemoryRecordStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn health(&self) -> Result<(), BackendError> {
        Ok(())
    }
}

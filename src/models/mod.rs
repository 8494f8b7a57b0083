pub mod report;
pub mod visit;

pub use report::{
    AgentCount, BucketCount, DarkModeCount, DeviceBreakdown, DeviceCount, HourCount,
    LoadTimeStats, Overview, RecentVisit, Report, TopPage, TrafficBreakdown,
};
pub use visit::{BrowserInfo, DeviceClass, IngestEvent, IngestResponse, OsInfo, VisitRecord};

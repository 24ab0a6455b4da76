/// Data layer: records, loading, filtering and the derived tables.
///
/// Architecture:
/// ```text
///  hour.{csv,json,parquet}   day.{csv,json,parquet}
///             │                      │
///             ▼                      ▼
///        ┌──────────┐
///        │  loader  │  parse + validate → Dataset (immutable)
///        └──────────┘
///             │
///             ▼
///        ┌──────────┐
///        │  filter  │  seasons × weather × date range → FilteredView
///        └──────────┘
///             │
///      ┌──────┴───────┐
///      ▼              ▼
///  ┌───────────┐  ┌────────┐
///  │ aggregate │  │ stats  │  monthly / top days / hourly / seasonal,
///  └───────────┘  └────────┘  describe, correlation
///      │              │
///      └──────┬───────┘
///             ▼
///        ┌──────────┐
///        │   view   │  render() → DashboardView
///        └──────────┘
/// ```

pub mod aggregate;
pub mod filter;
pub mod loader;
pub mod model;
pub mod stats;
pub mod view;

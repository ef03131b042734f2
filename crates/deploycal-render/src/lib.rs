//! # deploycal-render
//!
//! XLSX rendering of the deployment calendar.
//!
//! This crate provides:
//! - [`CalendarTable`]: header plus accumulated rows, written to a single styled sheet
//! - [`HeaderColumn`] and [`calendar_header`]: the column layout, A through K
//! - [`ReportNaming`]: file name and mail subject derived from the reporting window
//!
//! ## Example
//!
//! ```rust,ignore
//! use deploycal_core::Labels;
//! use deploycal_render::{calendar_header, CalendarTable};
//!
//! let labels = Labels::english();
//! let mut table = CalendarTable::new(calendar_header(&labels))?;
//! table.add_row(row);
//! table.save("cache/Deployment_calendar_04.03-10.03.xlsx")?;
//! ```

pub mod excel;
pub mod naming;

pub use excel::{build, calendar_header, column_index, CalendarTable, HeaderColumn, TableStyle};
pub use naming::ReportNaming;

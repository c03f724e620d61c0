//! Record export - flatten stored records back into portable JSON
//!
//! The reverse direction of the mappers: stored records become a JSON
//! array in which single-valued fields collapse to bare scalars, ready
//! to be fed back into record creation.

pub mod flatten;

pub use flatten::{
    export_records, flatten_record, flatten_records, ExportDocument, EXPORT_MIME,
};

//! Field declarations
//!
//! A [`FieldDescriptor`] is the metadata unit for one attribute of a record
//! type. Declarations come in five shapes ([`FieldSpec`]); all of them are
//! normalized by [`FieldDescriptor::build`], which rejects constraints that
//! cannot apply to the declared type.

mod constraints;
mod descriptor;
mod spec;

pub use constraints::{Constraints, Pattern};
pub use descriptor::{
    CustomValidator, FieldDescriptor, FieldOptions, FieldOrigin, FieldParser, ForeignRef, InvalidSpec,
};
pub use spec::FieldSpec;

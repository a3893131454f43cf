//! `#[derive(Fields)]` for structs whose members are arrays of point or cell
//! values, see `gridformat::Fields`.

mod fields;

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

/// Register every member of a struct as a field of a `gridformat::Writer`.
///
/// Members are point fields indexed by point id unless marked with
/// `#[gridformat(cell)]`, in which case they are cell fields in the order of
/// `Grid::cells`. The field name is the member name, or the value of
/// `#[gridformat(rename = "...")]`. Members marked `#[gridformat(skip)]` are
/// ignored.
#[proc_macro_derive(Fields, attributes(gridformat))]
pub fn derive_fields(input: TokenStream) -> TokenStream {
    // Parse the input tokens into a syntax tree
    let input = parse_macro_input!(input as DeriveInput);

    fields::derive(input)
        .unwrap_or_else(|e| e.write_errors())
        .into()
}

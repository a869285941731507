//! Field Collector: turns a raw submission into one display string per field.

use formpress_types::{FormSchema, NormalizedValues, SubmittedValues};

/// Separator between the values of a multi-select field.
pub const MULTI_VALUE_SEPARATOR: &str = ", ";

/// Collects the values for every field of `schema`, in declared order.
///
/// Multi-select fields join all submitted values in submission order; every
/// other field takes its first submitted value. Missing fields become `""`.
/// Submitted names the schema does not declare are ignored.
pub fn collect(schema: &FormSchema, submitted: &SubmittedValues) -> NormalizedValues {
    schema
        .fields
        .iter()
        .map(|field| {
            let value = if field.is_multi_select() {
                submitted.get_all(&field.name).join(MULTI_VALUE_SEPARATOR)
            } else {
                submitted.get(&field.name).unwrap_or_default().to_string()
            };
            (field.name.as_str(), value)
        })
        .collect()
}

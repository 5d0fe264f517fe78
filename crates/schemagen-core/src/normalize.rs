//! Semantic fix-up of validated schemas
//!
//! Exported leaves are pinned with a single-valued `enum` and every struct
//! lists all of its fields as `required`. The final schema describes defaults
//! instead: the first `enum` value becomes `default` and `required` goes away.

use crate::openapi::Schema;

/// Rewrite `enum` into `default` and clear `required`, recursively
pub fn normalize(schema: &mut Schema) {
    if schema.is_object() {
        for property in schema.properties.values_mut() {
            normalize(property);
        }
    } else if schema.is_array() {
        if let Some(items) = schema.items.as_deref_mut() {
            normalize(items);
        }
    }

    if !schema.enum_values.is_empty() {
        let mut values = std::mem::take(&mut schema.enum_values);
        schema.default = Some(values.swap_remove(0));
    }
    schema.required.clear();
}

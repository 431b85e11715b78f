//! Per-item wire-object generation.
//!
//! Components decide what the browser widget needs per row (a label, a
//! checked flag, per-column cell values) by registering [`DataGenerator`]s
//! with the communicator. When an item is pushed, every registered generator
//! runs over it and writes properties into the outgoing JSON object.

use std::sync::Arc;

use serde_json::{Map, Value};

/// Contributes properties to the wire object of each pushed item.
pub trait DataGenerator<T>: Send + Sync {
    /// Writes this generator's properties for `item` into `target`.
    fn generate(&self, item: &T, target: &mut Map<String, Value>);
}

/// A [`DataGenerator`] backed by a closure.
///
/// # Example
///
/// ```
/// use horizon_trellis::data::ClosureGenerator;
/// use serde_json::Value;
///
/// let generator = ClosureGenerator::new(|item: &String, target| {
///     target.insert("label".into(), Value::String(item.clone()));
/// });
/// ```
pub struct ClosureGenerator<T> {
    generate: Arc<dyn Fn(&T, &mut Map<String, Value>) + Send + Sync>,
}

impl<T> ClosureGenerator<T> {
    /// Creates a generator from a closure.
    pub fn new(generate: impl Fn(&T, &mut Map<String, Value>) + Send + Sync + 'static) -> Self {
        Self {
            generate: Arc::new(generate),
        }
    }
}

impl<T> DataGenerator<T> for ClosureGenerator<T> {
    fn generate(&self, item: &T, target: &mut Map<String, Value>) {
        (self.generate)(item, target);
    }
}

/// Runs every generator over `item` and returns the assembled wire object.
pub(crate) fn generate_item_data<T>(
    generators: &[Arc<dyn DataGenerator<T>>],
    item: &T,
) -> Map<String, Value> {
    let mut target = Map::new();
    for generator in generators {
        generator.generate(item, &mut target);
    }
    target
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generators_run_in_registration_order() {
        let first: Arc<dyn DataGenerator<String>> =
            Arc::new(ClosureGenerator::new(|item: &String, target| {
                target.insert("label".into(), Value::String(item.clone()));
                target.insert("shared".into(), Value::String("first".into()));
            }));
        let second: Arc<dyn DataGenerator<String>> =
            Arc::new(ClosureGenerator::new(|_: &String, target| {
                target.insert("shared".into(), Value::String("second".into()));
            }));

        let data = generate_item_data(&[first, second], &"apple".to_string());
        assert_eq!(data["label"], Value::String("apple".into()));
        // Later generators overwrite earlier ones on conflicts.
        assert_eq!(data["shared"], Value::String("second".into()));
    }

    #[test]
    fn test_no_generators_yields_empty_object() {
        let data = generate_item_data::<String>(&[], &"apple".to_string());
        assert!(data.is_empty());
    }
}

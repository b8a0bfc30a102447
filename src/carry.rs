use crate::value::Value;

static NULL: Value = Value::Null;

/// Last resolved value per output field for one tree walk.
///
/// Fields are addressed by their column index in the layout. A field that
/// was never written reads as [`Value::Null`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CarryForward {
    values: Vec<Value>,
}

impl CarryForward {
    pub fn with_width(width: usize) -> Self {
        Self {
            values: vec![Value::Null; width],
        }
    }

    /// Forgets every carried value, keeping the allocation.
    pub fn reset(&mut self, width: usize) {
        self.values.clear();
        self.values.resize(width, Value::Null);
    }

    pub fn width(&self) -> usize {
        self.values.len()
    }

    /// Pads with nulls or truncates to `width`, keeping the leading values.
    pub fn fit(&mut self, width: usize) {
        self.values.resize(width, Value::Null);
    }

    pub fn set(&mut self, field: usize, value: Value) {
        if let Some(slot) = self.values.get_mut(field) {
            *slot = value;
        }
    }

    pub fn get(&self, field: usize) -> &Value {
        self.values.get(field).unwrap_or(&NULL)
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

/// Values written on the current root-to-node path. `None` means the path
/// never set the field and the carried value applies.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PathContext {
    values: Vec<Option<Value>>,
}

impl PathContext {
    pub fn with_width(width: usize) -> Self {
        Self {
            values: vec![None; width],
        }
    }

    pub fn width(&self) -> usize {
        self.values.len()
    }

    pub fn fit(&mut self, width: usize) {
        self.values.resize(width, None);
    }

    pub fn set(&mut self, field: usize, value: Value) {
        if let Some(slot) = self.values.get_mut(field) {
            *slot = Some(value);
        }
    }

    pub fn get(&self, field: usize) -> Option<&Value> {
        self.values.get(field).and_then(Option::as_ref)
    }

    /// Repeat flag: the whole carried snapshot becomes path state.
    pub fn overlay(&mut self, carry: &CarryForward) {
        for (slot, carried) in self.values.iter_mut().zip(carry.values()) {
            *slot = Some(carried.clone());
        }
    }

    /// Output row: path values win, the carried snapshot fills the rest.
    pub fn resolve_row(&self, carry: &CarryForward) -> Vec<Value> {
        self.values
            .iter()
            .enumerate()
            .map(|(field, v)| match v {
                Some(v) => v.clone(),
                None => carry.get(field).clone(),
            })
            .collect()
    }
}

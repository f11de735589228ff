//! Field/value state machine with change notification.

/// One selectable value of a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldValue {
    /// Stable id, unique within the field.
    pub id: u32,
    pub name: String,
    /// Whether this value is selected at construction.
    pub is_default: bool,
}

impl FieldValue {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            is_default: false,
        }
    }

    #[must_use]
    pub fn as_default(mut self) -> Self {
        self.is_default = true;
        self
    }
}

/// A named configurable axis with an ordered value domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub values: Vec<FieldValue>,
}

impl Field {
    pub fn new(name: impl Into<String>, values: Vec<FieldValue>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// First value flagged default, else the first value.
    pub fn default_value(&self) -> Option<u32> {
        self.values
            .iter()
            .find(|v| v.is_default)
            .or_else(|| self.values.first())
            .map(|v| v.id)
    }

    pub fn contains(&self, id: u32) -> bool {
        self.values.iter().any(|v| v.id == id)
    }
}

/// Errors from misusing a [`Configurator`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfiguratorError {
    #[error("field {0} does not exist")]
    InvalidField(usize),
    #[error("value {value} is not in the domain of field {field}")]
    InvalidValue { field: usize, value: u32 },
    #[error("field {0} has no values")]
    EmptyDomain(usize),
}

/// Handle returned by [`Configurator::on_value_change`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback = Box<dyn FnMut(u32)>;

/// Current selection per field plus subscribers.
///
/// Every field always has exactly one current value from its domain.
/// Subscribers receive only the new value id, so they cannot reach back into
/// the configurator while it is notifying.
pub struct Configurator {
    fields: Vec<Field>,
    values: Vec<u32>,
    subscribers: Vec<Vec<(SubscriptionId, Callback)>>,
    next_subscription: u64,
}

impl Configurator {
    /// Build a configurator with every field at its default value.
    pub fn new(fields: Vec<Field>) -> Result<Self, ConfiguratorError> {
        let values = fields
            .iter()
            .enumerate()
            .map(|(i, f)| f.default_value().ok_or(ConfiguratorError::EmptyDomain(i)))
            .collect::<Result<Vec<_>, _>>()?;
        let subscribers = fields.iter().map(|_| Vec::new()).collect();
        Ok(Self {
            fields,
            values,
            subscribers,
            next_subscription: 0,
        })
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, field: usize) -> Option<&Field> {
        self.fields.get(field)
    }

    /// Value ids of a field, in declaration order.
    pub fn domain(&self, field: usize) -> Result<Vec<u32>, ConfiguratorError> {
        let f = self
            .fields
            .get(field)
            .ok_or(ConfiguratorError::InvalidField(field))?;
        Ok(f.values.iter().map(|v| v.id).collect())
    }

    /// Current value of a field; `None` when the field does not exist.
    pub fn value(&self, field: usize) -> Option<u32> {
        self.values.get(field).copied()
    }

    /// Validate a selection without applying it.
    pub fn check(&self, field: usize, value: u32) -> Result<(), ConfiguratorError> {
        let f = self
            .fields
            .get(field)
            .ok_or(ConfiguratorError::InvalidField(field))?;
        if !f.contains(value) {
            return Err(ConfiguratorError::InvalidValue { field, value });
        }
        Ok(())
    }

    /// Select a value and notify the field's subscribers in subscription order.
    ///
    /// Selecting the value that is already current notifies as well.
    pub fn set_value(&mut self, field: usize, value: u32) -> Result<(), ConfiguratorError> {
        self.check(field, value)?;
        self.values[field] = value;
        for (_, callback) in &mut self.subscribers[field] {
            callback(value);
        }
        Ok(())
    }

    /// Subscribe to changes of one field.
    pub fn on_value_change(
        &mut self,
        field: usize,
        callback: impl FnMut(u32) + 'static,
    ) -> Result<SubscriptionId, ConfiguratorError> {
        let subscribers = self
            .subscribers
            .get_mut(field)
            .ok_or(ConfiguratorError::InvalidField(field))?;
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        subscribers.push((id, Box::new(callback)));
        Ok(id)
    }

    /// Remove a subscription. Unknown ids are ignored.
    pub fn off_value_change(
        &mut self,
        field: usize,
        id: SubscriptionId,
    ) -> Result<(), ConfiguratorError> {
        let subscribers = self
            .subscribers
            .get_mut(field)
            .ok_or(ConfiguratorError::InvalidField(field))?;
        subscribers.retain(|(sid, _)| *sid != id);
        Ok(())
    }
}

impl std::fmt::Debug for Configurator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Configurator")
            .field("fields", &self.fields)
            .field("values", &self.values)
            .field(
                "subscribers",
                &self.subscribers.iter().map(Vec::len).collect::<Vec<_>>(),
            )
            .finish()
    }
}

//! Builder API for ergonomic batch construction.
//!
//! Provides a fluent interface for assembling load batches.
//!
//! # Example
//!
//! ```rust
//! use crs_registry::model::builder::BatchBuilder;
//! use crs_registry::model::{Kind, ObjectKey, UnitKind, UnitOfMeasure};
//!
//! let epsg = |code: &str| ObjectKey::new("EPSG", code);
//! let batch = BatchBuilder::new("units")
//!     .record(UnitOfMeasure::new(epsg("9001"), "metre", UnitKind::Length, Some(1.0)))
//!     .alias(Kind::UnitOfMeasure, epsg("9001"), "meter")
//!     .build();
//! assert_eq!(batch.len(), 2);
//! ```

use crate::model::{
    AliasName, Batch, Conversion, Deprecation, HelmertTransformation, Kind, ObjectKey, ObjectRef,
    ParameterValue, PreferredHub, Quantity, Record, Supersession,
};

/// Builder for constructing a [`Batch`].
#[derive(Debug, Clone, Default)]
pub struct BatchBuilder {
    name: String,
    records: Vec<Record>,
}

impl BatchBuilder {
    /// Creates a new builder for a batch with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            records: Vec::new(),
        }
    }

    /// Adds an already constructed record.
    pub fn record(mut self, record: impl Into<Record>) -> Self {
        self.records.push(record.into());
        self
    }

    /// Adds several records at once.
    pub fn records(mut self, records: impl IntoIterator<Item = Record>) -> Self {
        self.records.extend(records);
        self
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Adds a conversion using a builder function for its parameters.
    pub fn conversion<F>(
        mut self,
        key: ObjectKey,
        name: impl Into<String>,
        method: ObjectKey,
        area: ObjectKey,
        f: F,
    ) -> Self
    where
        F: FnOnce(ConversionBuilder) -> ConversionBuilder,
    {
        let builder = f(ConversionBuilder::default());
        self.records.push(Record::Conversion(Conversion {
            key,
            name: name.into(),
            method,
            params: builder.params,
            area,
            deprecated: builder.deprecated,
        }));
        self
    }

    /// Adds a Helmert transformation using a builder function.
    ///
    /// The translation defaults to zero with no unit; set it with
    /// [`HelmertBuilder::translation`].
    pub fn helmert<F>(
        mut self,
        key: ObjectKey,
        name: impl Into<String>,
        method: ObjectKey,
        crs: (ObjectKey, ObjectKey),
        area: ObjectKey,
        f: F,
    ) -> Self
    where
        F: FnOnce(HelmertBuilder) -> HelmertBuilder,
    {
        let op = HelmertTransformation {
            key,
            name: name.into(),
            method,
            source_crs: crs.0,
            target_crs: crs.1,
            area,
            ..Default::default()
        };
        let builder = f(HelmertBuilder { op });
        self.records.push(Record::HelmertTransformation(builder.op));
        self
    }

    // =========================================================================
    // Links
    // =========================================================================

    /// Adds an alternate name for an object.
    pub fn alias(mut self, kind: Kind, key: ObjectKey, alt_name: impl Into<String>) -> Self {
        self.records.push(Record::AliasName(AliasName {
            object: ObjectRef::new(kind, key),
            alt_name: alt_name.into(),
            source: None,
        }));
        self
    }

    /// Records that `superseded` was replaced by `replacement`.
    pub fn supersede(mut self, kind: Kind, superseded: ObjectKey, replacement: ObjectKey) -> Self {
        self.records.push(Record::Supersession(Supersession {
            kind,
            superseded,
            replacement,
            source: None,
            same_source_target_crs: true,
        }));
        self
    }

    /// Records that `deprecated` is retired in favour of `replacement`.
    pub fn deprecate(mut self, kind: Kind, deprecated: ObjectKey, replacement: ObjectKey) -> Self {
        self.records.push(Record::Deprecation(Deprecation {
            kind,
            deprecated,
            replacement,
            source: None,
        }));
        self
    }

    /// Adds a preferred hub datum for `source_datum`.
    pub fn hub(mut self, source_datum: ObjectKey, hub_datum: ObjectKey) -> Self {
        self.records.push(Record::PreferredHub(PreferredHub {
            source_datum,
            hub_datum,
        }));
        self
    }

    /// Builds the batch (consumes the builder).
    pub fn build(self) -> Batch {
        Batch {
            name: self.name,
            records: self.records,
        }
    }
}

/// Builder for conversion parameters.
#[derive(Debug, Clone, Default)]
pub struct ConversionBuilder {
    params: Vec<ParameterValue>,
    deprecated: bool,
}

impl ConversionBuilder {
    /// Appends a parameter value.
    pub fn param(mut self, parameter: ObjectKey, value: f64, unit: ObjectKey) -> Self {
        self.params.push(ParameterValue::new(parameter, value, unit));
        self
    }

    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }
}

/// Builder for the optional parameter groups of a Helmert transformation.
#[derive(Debug, Clone)]
pub struct HelmertBuilder {
    op: HelmertTransformation,
}

impl HelmertBuilder {
    pub fn translation(mut self, value: [f64; 3], unit: ObjectKey) -> Self {
        self.op.translation = Quantity::new(value, unit);
        self
    }

    pub fn rotation(mut self, value: [f64; 3], unit: ObjectKey) -> Self {
        self.op.rotation = Some(Quantity::new(value, unit));
        self
    }

    pub fn scale_difference(mut self, value: f64, unit: ObjectKey) -> Self {
        self.op.scale_difference = Some(Quantity::new(value, unit));
        self
    }

    pub fn rate_translation(mut self, value: [f64; 3], unit: ObjectKey) -> Self {
        self.op.rate_translation = Some(Quantity::new(value, unit));
        self
    }

    pub fn rate_rotation(mut self, value: [f64; 3], unit: ObjectKey) -> Self {
        self.op.rate_rotation = Some(Quantity::new(value, unit));
        self
    }

    pub fn rate_scale_difference(mut self, value: f64, unit: ObjectKey) -> Self {
        self.op.rate_scale_difference = Some(Quantity::new(value, unit));
        self
    }

    pub fn epoch(mut self, value: f64, unit: ObjectKey) -> Self {
        self.op.epoch = Some(Quantity::new(value, unit));
        self
    }

    pub fn pivot(mut self, value: [f64; 3], unit: ObjectKey) -> Self {
        self.op.pivot = Some(Quantity::new(value, unit));
        self
    }

    pub fn accuracy(mut self, metres: f64) -> Self {
        self.op.accuracy = Some(metres);
        self
    }

    pub fn deprecated(mut self) -> Self {
        self.op.deprecated = true;
        self
    }
}

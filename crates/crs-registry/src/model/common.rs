//! Leaf entities: units, celestial bodies, ellipsoids, areas of use and prime
//! meridians.

use crate::model::ObjectKey;

/// Semantic kind of a unit of measure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum UnitKind {
    #[default]
    Length = 1,
    Angle = 2,
    Scale = 3,
    Time = 4,
    Parametric = 5,
}

impl UnitKind {
    /// Creates a UnitKind from its wire representation.
    pub fn from_u8(v: u8) -> Option<UnitKind> {
        match v {
            1 => Some(UnitKind::Length),
            2 => Some(UnitKind::Angle),
            3 => Some(UnitKind::Scale),
            4 => Some(UnitKind::Time),
            5 => Some(UnitKind::Parametric),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            UnitKind::Length => "length",
            UnitKind::Angle => "angle",
            UnitKind::Scale => "scale",
            UnitKind::Time => "time",
            UnitKind::Parametric => "parametric",
        }
    }
}

/// A unit of measure with its factor to the SI base unit of its kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnitOfMeasure {
    pub key: ObjectKey,
    pub name: String,
    pub unit_kind: UnitKind,
    /// Factor to metre / radian / unity / second. `None` for units without a
    /// fixed factor (e.g. sexagesimal DMS).
    pub conv_factor: Option<f64>,
    pub deprecated: bool,
}

impl UnitOfMeasure {
    pub fn new(
        key: ObjectKey,
        name: impl Into<String>,
        unit_kind: UnitKind,
        conv_factor: Option<f64>,
    ) -> Self {
        Self {
            key,
            name: name.into(),
            unit_kind,
            conv_factor,
            deprecated: false,
        }
    }
}

/// A celestial body that ellipsoids approximate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CelestialBody {
    pub key: ObjectKey,
    pub name: String,
    /// Approximate semi-major axis in metres.
    pub semi_major_axis: f64,
}

impl CelestialBody {
    /// The body seeded into every new store.
    pub fn earth() -> Self {
        Self {
            key: ObjectKey::new("PROJ", "EARTH"),
            name: "Earth".to_string(),
            semi_major_axis: 6_378_137.0,
        }
    }
}

/// A reference ellipsoid.
///
/// Exactly one of `inv_flattening` and `semi_minor_axis` is set on a valid
/// record; the validator rejects both other combinations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ellipsoid {
    pub key: ObjectKey,
    pub name: String,
    pub celestial_body: ObjectKey,
    pub semi_major_axis: f64,
    /// Length unit of both axes.
    pub unit: ObjectKey,
    pub inv_flattening: Option<f64>,
    pub semi_minor_axis: Option<f64>,
    pub deprecated: bool,
}

impl Ellipsoid {
    /// Returns the inverse flattening, deriving it from the semi-minor axis
    /// when necessary. Spheres yield infinity.
    pub fn inverse_flattening(&self) -> Option<f64> {
        match (self.inv_flattening, self.semi_minor_axis) {
            (Some(rf), _) => Some(rf),
            (None, Some(b)) if b == self.semi_major_axis => Some(f64::INFINITY),
            (None, Some(b)) => Some(self.semi_major_axis / (self.semi_major_axis - b)),
            (None, None) => None,
        }
    }

    /// Returns true if the ellipsoid is a sphere.
    pub fn is_sphere(&self) -> bool {
        self.inverse_flattening().is_some_and(f64::is_infinite)
    }
}

/// A geographic bounding box in degrees.
///
/// `west > east` denotes a box crossing the antimeridian.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BoundingBox {
    pub south: f64,
    pub north: f64,
    pub west: f64,
    pub east: f64,
}

impl BoundingBox {
    pub fn new(south: f64, north: f64, west: f64, east: f64) -> Self {
        Self {
            south,
            north,
            west,
            east,
        }
    }

    /// The whole world.
    pub fn world() -> Self {
        Self::new(-90.0, 90.0, -180.0, 180.0)
    }

    pub fn crosses_antimeridian(&self) -> bool {
        self.west > self.east
    }

    /// Longitude span in degrees, accounting for antimeridian wrap.
    pub fn width(&self) -> f64 {
        if self.crosses_antimeridian() {
            self.east + 360.0 - self.west
        } else {
            self.east - self.west
        }
    }

    pub fn height(&self) -> f64 {
        self.north - self.south
    }

    /// Area in square degrees (plate carrée approximation).
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Splits the longitude range into non-wrapping intervals.
    fn lon_intervals(&self) -> ([(f64, f64); 2], usize) {
        if self.crosses_antimeridian() {
            ([(self.west, 180.0), (-180.0, self.east)], 2)
        } else {
            ([(self.west, self.east), (0.0, 0.0)], 1)
        }
    }

    fn lat_overlap(&self, other: &BoundingBox) -> Option<(f64, f64)> {
        let lo = self.south.max(other.south);
        let hi = self.north.min(other.north);
        (lo <= hi).then_some((lo, hi))
    }

    fn lon_overlaps(&self, other: &BoundingBox) -> Vec<(f64, f64)> {
        let (a, na) = self.lon_intervals();
        let (b, nb) = other.lon_intervals();
        let mut out = Vec::with_capacity(2);
        for &(aw, ae) in &a[..na] {
            for &(bw, be) in &b[..nb] {
                let lo = aw.max(bw);
                let hi = ae.min(be);
                if lo <= hi {
                    out.push((lo, hi));
                }
            }
        }
        out
    }

    /// Returns true if the boxes share at least one point.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.lat_overlap(other).is_some() && !self.lon_overlaps(other).is_empty()
    }

    /// Area in square degrees shared by both boxes.
    pub fn overlap_area(&self, other: &BoundingBox) -> f64 {
        let Some((south, north)) = self.lat_overlap(other) else {
            return 0.0;
        };
        let width: f64 = self.lon_overlaps(other).iter().map(|(w, e)| e - w).sum();
        width * (north - south)
    }

    /// Returns the intersection of both boxes.
    ///
    /// When the overlap is split in two longitude pieces that meet at the
    /// antimeridian they are joined into one wrapping box; otherwise the
    /// widest piece is returned.
    pub fn intersection(&self, other: &BoundingBox) -> Option<BoundingBox> {
        let (south, north) = self.lat_overlap(other)?;
        let mut pieces = self.lon_overlaps(other);
        if pieces.is_empty() {
            return None;
        }
        if pieces.len() == 2 {
            let (first, second) = (pieces[0], pieces[1]);
            let (east_piece, west_piece) = if first.1 == 180.0 {
                (first, second)
            } else {
                (second, first)
            };
            if east_piece.1 == 180.0 && west_piece.0 == -180.0 && east_piece.0 > west_piece.1 {
                return Some(BoundingBox::new(south, north, east_piece.0, west_piece.1));
            }
            pieces.sort_by(|a, b| (b.1 - b.0).total_cmp(&(a.1 - a.0)));
        }
        let (west, east) = pieces[0];
        Some(BoundingBox::new(south, north, west, east))
    }
}

/// A named area of use.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extent {
    pub key: ObjectKey,
    pub name: String,
    pub description: String,
    pub bbox: BoundingBox,
    pub deprecated: bool,
}

impl Extent {
    pub fn new(key: ObjectKey, name: impl Into<String>, bbox: BoundingBox) -> Self {
        let name = name.into();
        Self {
            key,
            description: name.clone(),
            name,
            bbox,
            deprecated: false,
        }
    }
}

/// A prime meridian expressed as a longitude from Greenwich.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrimeMeridian {
    pub key: ObjectKey,
    pub name: String,
    pub longitude: f64,
    /// Angle unit of `longitude`.
    pub unit: ObjectKey,
    pub deprecated: bool,
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_inverse_flattening_derivation() {
        let mut e = Ellipsoid {
            semi_major_axis: 6_378_137.0,
            inv_flattening: Some(298.257223563),
            ..Default::default()
        };
        assert_eq!(e.inverse_flattening(), Some(298.257223563));
        assert!(!e.is_sphere());

        e.inv_flattening = None;
        e.semi_minor_axis = Some(6_378_137.0);
        assert!(e.is_sphere());

        e.semi_minor_axis = Some(6_356_752.314245);
        let rf = e.inverse_flattening().unwrap();
        assert!((rf - 298.257223563).abs() < 1e-3);

        e.semi_minor_axis = None;
        assert_eq!(e.inverse_flattening(), None);
    }

    #[test]
    fn test_bbox_plain_intersection() {
        let europe = BoundingBox::new(32.88, 84.73, -16.1, 40.18);
        let france = BoundingBox::new(41.15, 51.56, -9.86, 10.38);
        assert!(europe.intersects(&france));
        assert_eq!(europe.intersection(&france), Some(france));
        assert!((europe.overlap_area(&france) - france.area()).abs() < 1e-9);

        let australia = BoundingBox::new(-43.7, -9.86, 112.85, 153.69);
        assert!(!europe.intersects(&australia));
        assert_eq!(europe.overlap_area(&australia), 0.0);
        assert_eq!(europe.intersection(&australia), None);
    }

    #[test]
    fn test_bbox_antimeridian() {
        // Fiji-like box wrapping the antimeridian.
        let fiji = BoundingBox::new(-20.0, -12.0, 176.0, -178.0);
        assert!(fiji.crosses_antimeridian());
        assert_eq!(fiji.width(), 6.0);

        let east_side = BoundingBox::new(-30.0, 0.0, 170.0, 180.0);
        assert!(fiji.intersects(&east_side));
        let cut = fiji.intersection(&east_side).unwrap();
        assert_eq!(cut, BoundingBox::new(-20.0, -12.0, 176.0, 180.0));

        let west_side = BoundingBox::new(-30.0, 0.0, -180.0, -170.0);
        assert!(fiji.intersects(&west_side));

        // World overlap keeps the wrapping box intact.
        let world = BoundingBox::world();
        assert_eq!(fiji.intersection(&world), Some(fiji));
        assert!((fiji.overlap_area(&world) - fiji.area()).abs() < 1e-9);
    }

    proptest! {
        #[test]
        fn prop_overlap_symmetric_and_bounded(
            s1 in -90.0f64..90.0, h1 in 0.0f64..90.0, w1 in -180.0f64..180.0, e1 in -180.0f64..180.0,
            s2 in -90.0f64..90.0, h2 in 0.0f64..90.0, w2 in -180.0f64..180.0, e2 in -180.0f64..180.0,
        ) {
            let a = BoundingBox::new(s1, (s1 + h1).min(90.0), w1, e1);
            let b = BoundingBox::new(s2, (s2 + h2).min(90.0), w2, e2);
            let ab = a.overlap_area(&b);
            let ba = b.overlap_area(&a);
            prop_assert!((ab - ba).abs() < 1e-6);
            prop_assert!(ab <= a.area() + 1e-6);
            prop_assert!(ab <= b.area() + 1e-6);
            prop_assert_eq!(a.intersects(&b), b.intersects(&a));
            if a.intersection(&b).is_some() {
                prop_assert!(a.intersects(&b));
            }
        }
    }
}

//! Binds control panel input onto the light rig.

use crate::scene::Lights;

/// The panel's controls, named after their element ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlId {
    TogglePointLight,
    AmbientIntensity,
    DirectionalIntensity,
    DirectionalX,
    DirectionalY,
    DirectionalZ,
    PointIntensity,
    PointX,
    PointY,
    PointZ,
}

impl ControlId {
    /// Every numeric control, in panel order.
    pub const NUMERIC: [ControlId; 9] = [
        Self::AmbientIntensity,
        Self::DirectionalIntensity,
        Self::DirectionalX,
        Self::DirectionalY,
        Self::DirectionalZ,
        Self::PointIntensity,
        Self::PointX,
        Self::PointY,
        Self::PointZ,
    ];

    pub fn element_id(&self) -> &'static str {
        match self {
            Self::TogglePointLight => "togglePointLight",
            Self::AmbientIntensity => "ambientIntensity",
            Self::DirectionalIntensity => "directionalIntensity",
            Self::DirectionalX => "directionalX",
            Self::DirectionalY => "directionalY",
            Self::DirectionalZ => "directionalZ",
            Self::PointIntensity => "pointIntensity",
            Self::PointX => "pointX",
            Self::PointY => "pointY",
            Self::PointZ => "pointZ",
        }
    }

    pub fn from_element_id(id: &str) -> Option<Self> {
        std::iter::once(Self::TogglePointLight)
            .chain(Self::NUMERIC)
            .find(|control| control.element_id() == id)
    }

    pub fn value(&self, lights: &Lights) -> Option<f32> {
        let mut lights = *lights;
        self.value_mut(&mut lights).map(|value| *value)
    }

    /// The light property this control writes, if it is numeric.
    pub fn value_mut<'a>(&self, lights: &'a mut Lights) -> Option<&'a mut f32> {
        Some(match self {
            Self::TogglePointLight => return None,
            Self::AmbientIntensity => &mut lights.ambient.intensity,
            Self::DirectionalIntensity => &mut lights.directional.intensity,
            Self::DirectionalX => &mut lights.directional.position.x,
            Self::DirectionalY => &mut lights.directional.position.y,
            Self::DirectionalZ => &mut lights.directional.position.z,
            Self::PointIntensity => &mut lights.point.intensity,
            Self::PointX => &mut lights.point.position.x,
            Self::PointY => &mut lights.point.position.y,
            Self::PointZ => &mut lights.point.position.z,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ControlEvent {
    Click(ControlId),
    /// A slider moved; the value is used as-is.
    Slider { id: ControlId, value: f32 },
    /// Text was typed into a numeric field.
    Text { id: ControlId, text: String },
}

/// Applies one control event. Values are not validated or clamped, and
/// unparsable text becomes NaN.
pub fn apply(event: &ControlEvent, lights: &mut Lights) {
    match event {
        ControlEvent::Click(ControlId::TogglePointLight) => {
            lights.point.visible = !lights.point.visible;
            log::debug!("Point light visible: {}", lights.point.visible);
        }
        ControlEvent::Click(id) => log::trace!("Ignoring click on {}", id.element_id()),
        ControlEvent::Slider { id, value } => set(*id, *value, lights),
        ControlEvent::Text { id, text } => set(*id, parse_float(text), lights),
    }
}

fn set(id: ControlId, value: f32, lights: &mut Lights) {
    match id.value_mut(lights) {
        Some(slot) => {
            *slot = value;
            log::trace!("{} = {}", id.element_id(), value);
        }
        None => log::trace!("{} takes no value", id.element_id()),
    }
}

/// Parses the longest numeric prefix of `text` after leading whitespace,
/// accepting `Infinity` with an optional sign. Returns NaN when there is no
/// numeric prefix.
pub fn parse_float(text: &str) -> f32 {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    if text[end..].starts_with("Infinity") {
        return if bytes.first() == Some(&b'-') {
            f32::NEG_INFINITY
        } else {
            f32::INFINITY
        };
    }

    let digits = |from: usize| bytes[from..].iter().take_while(|b| b.is_ascii_digit()).count();

    let integer = digits(end);
    end += integer;
    let mut fraction = 0;
    if bytes.get(end) == Some(&b'.') {
        fraction = digits(end + 1);
        if integer > 0 || fraction > 0 {
            end += 1 + fraction;
        }
    }
    if integer == 0 && fraction == 0 {
        return f32::NAN;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exponent = end + 1;
        if matches!(bytes.get(exponent), Some(b'+' | b'-')) {
            exponent += 1;
        }
        let exponent_digits = digits(exponent);
        if exponent_digits > 0 {
            end = exponent + exponent_digits;
        }
    }

    text[..end].parse().unwrap_or(f32::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_float_takes_numeric_prefix() {
        assert_eq!(parse_float("2.5"), 2.5);
        assert_eq!(parse_float("  3abc"), 3.0);
        assert_eq!(parse_float("-.5"), -0.5);
        assert_eq!(parse_float("7."), 7.0);
        assert_eq!(parse_float("1e3x"), 1000.0);
        assert_eq!(parse_float("1e"), 1.0);
        assert_eq!(parse_float("+4.25.1"), 4.25);
        assert_eq!(parse_float("-Infinityx"), f32::NEG_INFINITY);
    }

    #[test]
    fn parse_float_without_prefix_is_nan() {
        assert!(parse_float("abc").is_nan());
        assert!(parse_float("").is_nan());
        assert!(parse_float(".").is_nan());
        assert!(parse_float("-").is_nan());
        assert!(parse_float("e5").is_nan());
    }

    #[test]
    fn toggle_twice_restores_visibility() {
        let mut lights = Lights::default();
        let toggle = ControlEvent::Click(ControlId::TogglePointLight);
        apply(&toggle, &mut lights);
        assert!(!lights.point.visible);
        apply(&toggle, &mut lights);
        assert_eq!(lights, Lights::default());
    }

    #[test]
    fn numeric_controls_assign_verbatim() {
        let mut lights = Lights::default();
        apply(
            &ControlEvent::Slider {
                id: ControlId::AmbientIntensity,
                value: 1.75,
            },
            &mut lights,
        );
        apply(
            &ControlEvent::Text {
                id: ControlId::PointZ,
                text: "-12.5".to_owned(),
            },
            &mut lights,
        );
        apply(
            &ControlEvent::Slider {
                id: ControlId::DirectionalIntensity,
                value: -3.0,
            },
            &mut lights,
        );
        assert_eq!(lights.ambient.intensity, 1.75);
        assert_eq!(lights.point.position.z, -12.5);
        assert_eq!(lights.directional.intensity, -3.0);
    }

    #[test]
    fn garbage_text_propagates_nan() {
        let mut lights = Lights::default();
        apply(
            &ControlEvent::Text {
                id: ControlId::DirectionalX,
                text: "left".to_owned(),
            },
            &mut lights,
        );
        assert!(lights.directional.position.x.is_nan());
    }

    #[test]
    fn element_ids_round_trip() {
        for id in std::iter::once(ControlId::TogglePointLight).chain(ControlId::NUMERIC) {
            assert_eq!(ControlId::from_element_id(id.element_id()), Some(id));
        }
        assert_eq!(ControlId::from_element_id("pointW"), None);
    }
}

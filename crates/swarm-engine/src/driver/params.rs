/// A bounded numeric parameter.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Param {
    pub value: f32,
    pub min: f32,
    pub max: f32,
    pub step: f32,
}

impl Param {
    pub fn new(value: f32, min: f32, max: f32, step: f32) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        Self {
            value: value.clamp(min, max),
            min,
            max,
            step: step.abs(),
        }
    }

    fn set(&mut self, value: f32) -> f32 {
        self.value = value.clamp(self.min, self.max);
        self.value
    }
}

/// Named tweakable parameters plus text readouts.
///
/// Values are clamped to their bounds on every change, so whatever the frame
/// reads back is always in range.
#[derive(Debug, Clone, Default)]
pub struct DebugParams {
    params: Vec<(String, Param)>,
    readouts: Vec<(String, String)>,
}

impl DebugParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a parameter.
    pub fn add(&mut self, name: &str, param: Param) -> &mut Self {
        match self.params.iter_mut().find(|(n, _)| n == name) {
            Some((_, p)) => *p = param,
            None => self.params.push((name.to_string(), param)),
        }
        self
    }

    pub fn param(&self, name: &str) -> Option<&Param> {
        self.params.iter().find(|(n, _)| n == name).map(|(_, p)| p)
    }

    pub fn get(&self, name: &str) -> Option<f32> {
        self.param(name).map(|p| p.value)
    }

    /// Stores `value` clamped to the parameter's bounds and returns it.
    pub fn set(&mut self, name: &str, value: f32) -> Option<f32> {
        self.params
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, p)| p.set(value))
    }

    pub fn step_up(&mut self, name: &str) -> Option<f32> {
        let p = *self.param(name)?;
        self.set(name, p.value + p.step)
    }

    pub fn step_down(&mut self, name: &str) -> Option<f32> {
        let p = *self.param(name)?;
        self.set(name, p.value - p.step)
    }

    pub fn params(&self) -> impl Iterator<Item = (&str, &Param)> {
        self.params.iter().map(|(n, p)| (n.as_str(), p))
    }

    pub fn set_readout(&mut self, name: &str, text: impl Into<String>) {
        let text = text.into();
        match self.readouts.iter_mut().find(|(n, _)| n == name) {
            Some((_, t)) => *t = text,
            None => self.readouts.push((name.to_string(), text)),
        }
    }

    pub fn readout(&self, name: &str) -> Option<&str> {
        self.readouts
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, t)| t.as_str())
    }

    pub fn readouts(&self) -> impl Iterator<Item = (&str, &str)> {
        self.readouts.iter().map(|(n, t)| (n.as_str(), t.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> DebugParams {
        let mut p = DebugParams::new();
        p.add("count", Param::new(3.0, 1.0, 8.0, 1.0))
            .add("speed", Param::new(0.5, 0.0, 1.0, 0.25));
        p
    }

    #[test]
    fn values_are_clamped_on_set() {
        let mut p = params();
        assert_eq!(p.set("count", 100.0), Some(8.0));
        assert_eq!(p.set("count", -3.0), Some(1.0));
        assert_eq!(p.get("count"), Some(1.0));
        assert_eq!(p.set("missing", 1.0), None);
    }

    #[test]
    fn stepping_stops_at_bounds() {
        let mut p = params();
        assert_eq!(p.step_up("speed"), Some(0.75));
        assert_eq!(p.step_up("speed"), Some(1.0));
        assert_eq!(p.step_up("speed"), Some(1.0));
        p.set("speed", 0.0);
        assert_eq!(p.step_down("speed"), Some(0.0));
    }

    #[test]
    fn initial_value_is_clamped_and_bounds_ordered() {
        let param = Param::new(20.0, 10.0, 0.0, -2.0);
        assert_eq!(param.min, 0.0);
        assert_eq!(param.max, 10.0);
        assert_eq!(param.value, 10.0);
        assert_eq!(param.step, 2.0);
    }

    #[test]
    fn readouts_are_replaced_in_place() {
        let mut p = params();
        p.set_readout("fps", "0.0");
        p.set_readout("fps", "59.9");
        assert_eq!(p.readout("fps"), Some("59.9"));
        assert_eq!(p.readouts().count(), 1);
    }
}

use crate::MIN_TIME;

/*
Parameter Automation
====================

Instead of writing a parameter "now", the control side schedules what the
parameter should do at a point on the audio clock. The audio thread evaluates
the resulting curve sample by sample, so a change that arrives a little late
still lands exactly where it was scheduled.

Vocabulary
----------

  event       One scheduled instruction, stamped with an audio-clock time in
              seconds.

  set-value   Jump to a value at `time` and hold it.

  ramp        Linear ramp that ENDS at `time`. It starts from wherever the
              previous event left the parameter, at the previous event's time.

  set-target  Exponential approach toward `target`, starting at `time`:

                v(t) = target + (v0 - target) × e^(-(t - time) / τ)

              It runs until the next event, which starts from whatever value
              the curve had reached by then.

  cancel      Drop every event at or after a time.

  hold        Cancel, then pin the parameter at the value it had at that
              instant. This is what releases and pitch glides use, so a new
              ramp always starts from the true current level.


  Level
    0.8 ┤    ╱╲
        │   ╱  ╲___________ hold
    0.5 ┤  ╱               ●╲
        │ ╱                  ╲  ramp → 0
    0.0 └╱────────────────────╲──→ audio clock
         set   ramp  ramp    cancel+hold

Events are kept sorted by time; events at equal times keep insertion order.
*/

/// A single scheduled instruction on a parameter timeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AutomationEvent {
    SetValue { time: f64, value: f32 },
    LinearRamp { time: f64, value: f32 },
    SetTarget { time: f64, target: f32, time_constant: f32 },
}

impl AutomationEvent {
    pub fn time(&self) -> f64 {
        match *self {
            AutomationEvent::SetValue { time, .. }
            | AutomationEvent::LinearRamp { time, .. }
            | AutomationEvent::SetTarget { time, .. } => time,
        }
    }
}

/// An operation on a timeline. The same op stream applied to two timelines
/// yields the same curve, which is how the control side mirrors the audio side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AutomationOp {
    Schedule(AutomationEvent),
    CancelScheduled { from: f64 },
    CancelAndHold { at: f64 },
}

/// Anything that accepts automation ops and can report its value.
pub trait ParamTimeline {
    fn apply(&mut self, op: AutomationOp);

    fn value_at(&self, time: f64) -> f32;

    fn set_value_at(&mut self, value: f32, time: f64) {
        self.apply(AutomationOp::Schedule(AutomationEvent::SetValue { time, value }));
    }

    fn linear_ramp_to(&mut self, value: f32, time: f64) {
        self.apply(AutomationOp::Schedule(AutomationEvent::LinearRamp { time, value }));
    }

    fn set_target_at(&mut self, target: f32, time: f64, time_constant: f32) {
        self.apply(AutomationOp::Schedule(AutomationEvent::SetTarget {
            time,
            target,
            time_constant,
        }));
    }

    fn cancel_scheduled(&mut self, from: f64) {
        self.apply(AutomationOp::CancelScheduled { from });
    }

    fn cancel_and_hold(&mut self, at: f64) {
        self.apply(AutomationOp::CancelAndHold { at });
    }
}

const EVENT_CAPACITY: usize = 16;

#[derive(Debug, Clone)]
pub struct AutomationParam {
    // Value before the first event
    initial: f32,
    events: Vec<AutomationEvent>,
}

impl AutomationParam {
    pub fn new(initial: f32) -> Self {
        Self {
            initial,
            events: Vec::with_capacity(EVENT_CAPACITY),
        }
    }

    pub fn events(&self) -> &[AutomationEvent] {
        &self.events
    }

    fn insert(&mut self, event: AutomationEvent) {
        let idx = self.events.partition_point(|e| e.time() <= event.time());
        self.events.insert(idx, event);
    }

    /// Collapse events that lie entirely before `time` without changing the
    /// curve from `time` onward. Keeps the timeline short on long notes.
    pub fn prune(&mut self, time: f64) {
        while self.events.len() >= 2 && self.events[1].time() <= time {
            let anchor = self.events[1].time();
            let held = self.value_at(anchor);
            self.events.remove(0);
            self.initial = held;

            if let AutomationEvent::LinearRamp { time, .. } = self.events[0] {
                self.events[0] = AutomationEvent::SetValue { time, value: held };
            }
        }
    }

    /// Fill `out` with the curve sampled at `start + i / sample_rate`.
    pub fn fill(&self, out: &mut [f32], start: f64, sample_rate: f32) {
        if self.events.is_empty() {
            out.fill(self.initial);
            return;
        }

        let dt = 1.0 / f64::from(sample_rate);
        for (i, sample) in out.iter_mut().enumerate() {
            *sample = self.value_at(start + i as f64 * dt);
        }
    }
}

#[inline]
fn approach(from: f32, target: f32, elapsed: f64, time_constant: f32) -> f32 {
    let tau = f64::from(time_constant.max(MIN_TIME));
    target + (from - target) * (-elapsed / tau).exp() as f32
}

impl ParamTimeline for AutomationParam {
    fn apply(&mut self, op: AutomationOp) {
        match op {
            AutomationOp::Schedule(event) => self.insert(event),
            AutomationOp::CancelScheduled { from } => {
                self.events.retain(|e| e.time() < from);
            }
            AutomationOp::CancelAndHold { at } => {
                let held = self.value_at(at);
                self.events.retain(|e| e.time() < at);
                self.insert(AutomationEvent::SetValue { time: at, value: held });
            }
        }
    }

    fn value_at(&self, t: f64) -> f32 {
        let mut value = self.initial;
        let mut prev_time = f64::NEG_INFINITY;

        for (i, event) in self.events.iter().enumerate() {
            match *event {
                AutomationEvent::SetValue { time, value: v } => {
                    if t < time {
                        return value;
                    }
                    value = v;
                    prev_time = time;
                }
                AutomationEvent::LinearRamp { time, value: v } => {
                    if t < time {
                        let span = time - prev_time;
                        // An unanchored ramp holds, then lands on its value
                        if !span.is_finite() || span <= 0.0 {
                            return value;
                        }
                        let progress = ((t - prev_time) / span) as f32;
                        return value + (v - value) * progress;
                    }
                    value = v;
                    prev_time = time;
                }
                AutomationEvent::SetTarget {
                    time,
                    target,
                    time_constant,
                } => {
                    if t < time {
                        return value;
                    }
                    match self.events.get(i + 1).map(AutomationEvent::time) {
                        Some(end) if t >= end => {
                            value = approach(value, target, end - time, time_constant);
                            prev_time = end;
                        }
                        _ => return approach(value, target, t - time, time_constant),
                    }
                }
            }
        }

        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn holds_initial_value_without_events() {
        let param = AutomationParam::new(0.25);
        assert!(close(param.value_at(0.0), 0.25));
        assert!(close(param.value_at(100.0), 0.25));
    }

    #[test]
    fn linear_ramp_interpolates_from_previous_event() {
        let mut param = AutomationParam::new(0.0);
        param.set_value_at(0.0, 1.0);
        param.linear_ramp_to(1.0, 2.0);
        param.linear_ramp_to(0.5, 3.0);

        assert!(close(param.value_at(0.5), 0.0));
        assert!(close(param.value_at(1.5), 0.5));
        assert!(close(param.value_at(2.0), 1.0));
        assert!(close(param.value_at(2.5), 0.75));
        assert!(close(param.value_at(10.0), 0.5));
    }

    #[test]
    fn set_target_approaches_exponentially() {
        let mut param = AutomationParam::new(1.0);
        param.set_target_at(2.0, 1.0, 0.5);

        assert!(close(param.value_at(0.9), 1.0));
        assert!(close(param.value_at(1.0), 1.0));
        let one_tau = param.value_at(1.5);
        assert!(close(one_tau, 2.0 - (-1.0f32).exp()));
        assert!(param.value_at(6.0) > 1.999);
    }

    #[test]
    fn next_event_starts_from_target_curve() {
        let mut param = AutomationParam::new(0.0);
        param.set_target_at(1.0, 0.0, 1.0);
        param.cancel_and_hold(1.0);

        let held = 1.0 - (-1.0f32).exp();
        assert!(close(param.value_at(1.0), held));
        assert!(close(param.value_at(5.0), held));
    }

    #[test]
    fn cancel_drops_future_events() {
        let mut param = AutomationParam::new(0.0);
        param.set_value_at(0.0, 0.0);
        param.linear_ramp_to(1.0, 1.0);
        param.set_value_at(0.2, 2.0);

        param.cancel_scheduled(1.0);
        assert_eq!(param.events().len(), 1);
        // The ramp ended at 1.0 and was cancelled, so the value never moves
        assert!(close(param.value_at(0.5), 0.0));
    }

    #[test]
    fn cancel_and_hold_pins_mid_ramp_value() {
        let mut param = AutomationParam::new(0.0);
        param.set_value_at(0.0, 0.0);
        param.linear_ramp_to(1.0, 1.0);

        param.cancel_and_hold(0.25);
        assert!(close(param.value_at(0.25), 0.25));
        assert!(close(param.value_at(0.9), 0.25));

        // Before the hold the original curve is untouched
        assert!(close(param.value_at(0.1), 0.1));
    }

    #[test]
    fn equal_times_keep_insertion_order() {
        let mut param = AutomationParam::new(0.0);
        param.set_value_at(0.3, 1.0);
        param.set_value_at(0.6, 1.0);
        assert!(close(param.value_at(1.0), 0.6));
    }

    #[test]
    fn prune_preserves_curve_after_cut() {
        let mut param = AutomationParam::new(0.0);
        param.set_value_at(0.0, 0.0);
        param.linear_ramp_to(1.0, 1.0);
        param.linear_ramp_to(0.5, 2.0);
        param.set_target_at(0.0, 2.5, 0.2);

        let times = [1.2, 1.7, 2.0, 2.4, 2.6, 3.5];
        let before: Vec<f32> = times.iter().map(|&t| param.value_at(t)).collect();

        param.prune(2.2);
        assert!(param.events().len() < 4);

        for (&t, &expected) in times.iter().zip(&before) {
            if t >= 2.2 {
                assert!(close(param.value_at(t), expected), "t={}", t);
            }
        }
    }

    #[test]
    fn fill_samples_curve_on_audio_grid() {
        let mut param = AutomationParam::new(0.0);
        param.set_value_at(0.0, 0.0);
        param.linear_ramp_to(1.0, 0.01);

        let mut out = [0.0f32; 10];
        param.fill(&mut out, 0.0, 1_000.0);
        for (i, &v) in out.iter().enumerate() {
            assert!(close(v, i as f32 / 10.0));
        }
    }
}

use serde::{Deserialize, Serialize};

/// One recomputation concern of a drawable element.
///
/// A set bit means "this part is stale and must be serviced by the next
/// `draw()`". States are grouped by the element family that declares them;
/// each element restricts itself to its own supported mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConsistencyState {
    // shared by every element
    Enabled,
    Container,
    ZIndex,
    Appearance,
    Bounds,
    // axis
    AxisTitle,
    AxisLabels,
    AxisTicks,
    AxisOverlap,
    // data grid
    GridRedraw,
    GridPosition,
    GridHover,
    GridClick,
    // resource chart
    ChartXScalePosition,
    ChartXScaleRange,
    ChartYRange,
    ChartTimeLine,
    ChartXScroll,
    ChartYScroll,
    ChartGrid,
    ChartData,
    ChartConflicts,
    ChartActivityStates,
    // scales
    ScaleRecalculation,
    // scrollbar
    ScrollbarRange,
    // time-line header
    TimeLineLevels,
}

impl ConsistencyState {
    pub const fn bit(self) -> u32 {
        match self {
            Self::Enabled => 1 << 0,
            Self::Container => 1 << 1,
            Self::ZIndex => 1 << 2,
            Self::Appearance => 1 << 3,
            Self::Bounds => 1 << 4,
            Self::AxisTitle => 1 << 5,
            Self::AxisLabels => 1 << 6,
            Self::AxisTicks => 1 << 7,
            Self::AxisOverlap => 1 << 8,
            Self::GridRedraw => 1 << 9,
            Self::GridPosition => 1 << 10,
            Self::GridHover => 1 << 11,
            Self::GridClick => 1 << 12,
            Self::ChartXScalePosition => 1 << 13,
            Self::ChartXScaleRange => 1 << 14,
            Self::ChartYRange => 1 << 15,
            Self::ChartTimeLine => 1 << 16,
            Self::ChartXScroll => 1 << 17,
            Self::ChartYScroll => 1 << 18,
            Self::ChartGrid => 1 << 19,
            Self::ChartData => 1 << 20,
            Self::ScaleRecalculation => 1 << 21,
            Self::ScrollbarRange => 1 << 22,
            Self::TimeLineLevels => 1 << 23,
            Self::ChartConflicts => 1 << 24,
            Self::ChartActivityStates => 1 << 25,
        }
    }
}

/// Bitmask of consistency states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct ConsistencyStates {
    bits: u32,
}

impl ConsistencyStates {
    /// States every drawable element supports.
    pub const ELEMENT: Self = Self::none()
        .with_state(ConsistencyState::Enabled)
        .with_state(ConsistencyState::Container)
        .with_state(ConsistencyState::ZIndex)
        .with_state(ConsistencyState::Appearance)
        .with_state(ConsistencyState::Bounds);

    #[must_use]
    pub const fn none() -> Self {
        Self { bits: 0 }
    }

    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self { bits }
    }

    #[must_use]
    pub const fn bits(self) -> u32 {
        self.bits
    }

    #[must_use]
    pub const fn from_state(state: ConsistencyState) -> Self {
        Self { bits: state.bit() }
    }

    #[must_use]
    pub const fn with_state(self, state: ConsistencyState) -> Self {
        Self {
            bits: self.bits | state.bit(),
        }
    }

    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self {
            bits: self.bits | other.bits,
        }
    }

    #[must_use]
    pub const fn intersection(self, other: Self) -> Self {
        Self {
            bits: self.bits & other.bits,
        }
    }

    #[must_use]
    pub const fn difference(self, other: Self) -> Self {
        Self {
            bits: self.bits & !other.bits,
        }
    }

    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        (self.bits & other.bits) != 0
    }

    #[must_use]
    pub const fn contains_state(self, state: ConsistencyState) -> bool {
        self.intersects(Self::from_state(state))
    }

    #[must_use]
    pub const fn is_none(self) -> bool {
        self.bits == 0
    }
}

impl From<ConsistencyState> for ConsistencyStates {
    fn from(state: ConsistencyState) -> Self {
        Self::from_state(state)
    }
}

/// Reason an object changed, dispatched from a child to its listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Signal {
    NeedsRedraw,
    NeedsReapplication,
    NeedsRecalculation,
    BoundsChanged,
    DataChanged,
    MetaChanged,
    EnabledStateChanged,
}

impl Signal {
    pub const fn bit(self) -> u8 {
        match self {
            Self::NeedsRedraw => 1 << 0,
            Self::NeedsReapplication => 1 << 1,
            Self::NeedsRecalculation => 1 << 2,
            Self::BoundsChanged => 1 << 3,
            Self::DataChanged => 1 << 4,
            Self::MetaChanged => 1 << 5,
            Self::EnabledStateChanged => 1 << 6,
        }
    }
}

/// Bitmask of signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Signals {
    bits: u8,
}

impl Signals {
    const ALL_BITS: u8 = Signal::NeedsRedraw.bit()
        | Signal::NeedsReapplication.bit()
        | Signal::NeedsRecalculation.bit()
        | Signal::BoundsChanged.bit()
        | Signal::DataChanged.bit()
        | Signal::MetaChanged.bit()
        | Signal::EnabledStateChanged.bit();

    /// Signals every drawable element may dispatch.
    pub const ELEMENT: Self = Self::from_signal(Signal::NeedsRedraw)
        .with_signal(Signal::BoundsChanged)
        .with_signal(Signal::EnabledStateChanged);

    #[must_use]
    pub const fn none() -> Self {
        Self { bits: 0 }
    }

    #[must_use]
    pub const fn all() -> Self {
        Self {
            bits: Self::ALL_BITS,
        }
    }

    #[must_use]
    pub const fn bits(self) -> u8 {
        self.bits
    }

    #[must_use]
    pub const fn from_signal(signal: Signal) -> Self {
        Self { bits: signal.bit() }
    }

    #[must_use]
    pub const fn with_signal(self, signal: Signal) -> Self {
        Self {
            bits: self.bits | signal.bit(),
        }
    }

    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self {
            bits: self.bits | other.bits,
        }
    }

    #[must_use]
    pub const fn intersection(self, other: Self) -> Self {
        Self {
            bits: self.bits & other.bits,
        }
    }

    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        (self.bits & other.bits) != 0
    }

    #[must_use]
    pub const fn contains_signal(self, signal: Signal) -> bool {
        self.intersects(Self::from_signal(signal))
    }

    #[must_use]
    pub const fn is_none(self) -> bool {
        self.bits == 0
    }
}

impl From<Signal> for Signals {
    fn from(signal: Signal) -> Self {
        Self::from_signal(signal)
    }
}

#[cfg(test)]
mod tests {
    use super::{ConsistencyState, ConsistencyStates, Signal, Signals};

    #[test]
    fn consistency_states_union_and_difference_work() {
        let states = ConsistencyStates::from_state(ConsistencyState::Bounds)
            .with_state(ConsistencyState::AxisLabels);
        assert!(states.contains_state(ConsistencyState::Bounds));
        assert!(states.contains_state(ConsistencyState::AxisLabels));
        assert!(!states.contains_state(ConsistencyState::AxisTicks));

        let rest = states.difference(ConsistencyState::Bounds.into());
        assert!(!rest.contains_state(ConsistencyState::Bounds));
        assert!(rest.contains_state(ConsistencyState::AxisLabels));
    }

    #[test]
    fn element_mask_covers_base_family_only() {
        let mask = ConsistencyStates::ELEMENT;
        assert!(mask.contains_state(ConsistencyState::Enabled));
        assert!(mask.contains_state(ConsistencyState::Bounds));
        assert!(!mask.contains_state(ConsistencyState::AxisOverlap));
        assert!(!mask.contains_state(ConsistencyState::ChartYRange));
    }

    #[test]
    fn signal_bits_are_distinct() {
        let all = [
            Signal::NeedsRedraw,
            Signal::NeedsReapplication,
            Signal::NeedsRecalculation,
            Signal::BoundsChanged,
            Signal::DataChanged,
            Signal::MetaChanged,
            Signal::EnabledStateChanged,
        ];
        let mut seen = 0u8;
        for signal in all {
            assert_eq!(seen & signal.bit(), 0);
            seen |= signal.bit();
        }
        assert_eq!(Signals::all().bits(), seen);
    }
}

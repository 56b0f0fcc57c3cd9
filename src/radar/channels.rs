//! Per-channel peak readout of the radar.
//!
//! A distance of 0 means "no target on this channel" and is never a real
//! range; [`RadarChannelSet::nearest`] treats it as infinitely far.

/// Sentinel printed in place of "no target" in the serial log rendering
pub const NO_TARGET_LOG_VALUE: &str = "1E8";

/// One peak channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RadarChannel {
    /// Peak distance in mm, 0 when nothing was detected
    pub distance_mm: u32,

    /// Peak strength, raw register value
    pub strength: i32,
}

impl RadarChannel {
    pub fn has_target(&self) -> bool {
        self.distance_mm != 0
    }
}

/// Ordered peak channels; index is the channel id
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RadarChannelSet {
    channels: Vec<RadarChannel>,
}

impl RadarChannelSet {
    pub fn new(channels: Vec<RadarChannel>) -> Self {
        Self { channels }
    }

    /// A set of `count` channels with no detections
    pub fn empty(count: usize) -> Self {
        Self {
            channels: vec![RadarChannel::default(); count],
        }
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn get(&self, channel: usize) -> Option<&RadarChannel> {
        self.channels.get(channel)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RadarChannel> {
        self.channels.iter()
    }

    /// Nearest detected distance in mm
    ///
    /// # Returns
    ///
    /// * `Option<u32>` - Smallest non-zero distance, or `None` when no channel detected anything
    ///
    /// # Examples
    ///
    /// ```
    /// use tracker_relay::radar::channels::{RadarChannel, RadarChannelSet};
    ///
    /// let set = RadarChannelSet::new(vec![
    ///     RadarChannel { distance_mm: 0, strength: 0 },
    ///     RadarChannel { distance_mm: 1200, strength: 40 },
    /// ]);
    /// assert_eq!(set.nearest(), Some(1200));
    /// assert_eq!(RadarChannelSet::empty(9).nearest(), None);
    /// ```
    pub fn nearest(&self) -> Option<u32> {
        self.channels
            .iter()
            .filter(|c| c.has_target())
            .map(|c| c.distance_mm)
            .min()
    }

    /// Comma-separated distances then strengths, for the serial log
    ///
    /// Channels without a target print [`NO_TARGET_LOG_VALUE`] instead of 0.
    pub fn to_log_fields(&self) -> String {
        self.channels
            .iter()
            .map(|c| {
                if c.has_target() {
                    c.distance_mm.to_string()
                } else {
                    NO_TARGET_LOG_VALUE.to_string()
                }
            })
            .chain(self.channels.iter().map(|c| c.strength.to_string()))
            .collect::<Vec<_>>()
            .join(",")
    }
}

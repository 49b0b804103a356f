//! Channel resolution.
//!
//! EXR files store channels under arbitrary names in alphabetical order,
//! each with its own sample type. Callers see a canonical layout instead:
//! red, green, blue, alpha and depth first (whichever exist), then every
//! other channel in file order.
//!
//! ```text
//! file order:     B  G  R  Z  extra
//! user_index:     2  1  0  3  4
//! canonical:      R  G  B  Z  extra
//! ```
//!
//! Recognized names are matched ASCII case-insensitively: `R`/`Red`,
//! `G`/`Green`, `B`/`Blue`, `A`/`Alpha`, `Z`. When two file channels claim
//! the same role the later one wins and the earlier one is treated as an
//! ordinary channel.

use exr::meta::attribute::{ChannelList, SampleType};
use imageio::FormatSpec;

/// Canonical channel names, in output order.
pub const CANONICAL: [&str; 5] = ["R", "G", "B", "A", "Z"];

const ALPHA: usize = 3;
const DEPTH: usize = 4;

/// Role of a file channel name, as an index into [`CANONICAL`].
fn role(name: &str) -> Option<usize> {
    const ALIASES: [(&str, usize); 9] = [
        ("R", 0),
        ("Red", 0),
        ("G", 1),
        ("Green", 1),
        ("B", 2),
        ("Blue", 2),
        ("A", ALPHA),
        ("Alpha", ALPHA),
        ("Z", DEPTH),
    ];

    ALIASES
        .iter()
        .find(|(alias, _)| alias.eq_ignore_ascii_case(name))
        .map(|&(_, role)| role)
}

/// Mapping between file channels and the canonical layout.
///
/// All per-channel vectors are indexed by file channel except
/// [`names`](Self::names), which is in canonical order.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelMap {
    /// Channel names in file order.
    pub file_names: Vec<String>,
    /// Stored sample type of each file channel.
    pub file_types: Vec<SampleType>,
    /// Canonical position of each file channel.
    pub user_index: Vec<usize>,
    /// Channel names in canonical order.
    pub names: Vec<String>,
    /// Canonical index of the alpha channel.
    pub alpha: Option<usize>,
    /// Canonical index of the depth channel.
    pub z: Option<usize>,
}

impl ChannelMap {
    /// Resolves a list of `(name, sample type)` pairs given in file order.
    pub fn resolve<'a, I>(channels: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, SampleType)>,
    {
        let mut file_names = Vec::new();
        let mut file_types = Vec::new();
        let mut claimed: [Option<usize>; CANONICAL.len()] = [None; CANONICAL.len()];

        for (index, (name, sample_type)) in channels.into_iter().enumerate() {
            if let Some(role) = role(name) {
                claimed[role] = Some(index);
            }
            file_names.push(name.to_string());
            file_types.push(sample_type);
        }

        let count = file_names.len();
        let mut user_index = vec![usize::MAX; count];
        let mut names = Vec::with_capacity(count);
        let mut alpha = None;
        let mut z = None;

        for (role, file_index) in claimed.iter().enumerate() {
            let Some(file_index) = *file_index else {
                continue;
            };
            match role {
                ALPHA => alpha = Some(names.len()),
                DEPTH => z = Some(names.len()),
                _ => {}
            }
            user_index[file_index] = names.len();
            names.push(CANONICAL[role].to_string());
        }

        for file_index in 0..count {
            if user_index[file_index] == usize::MAX {
                user_index[file_index] = names.len();
                names.push(file_names[file_index].clone());
            }
        }

        Self {
            file_names,
            file_types,
            user_index,
            names,
            alpha,
            z,
        }
    }

    /// Resolves the channel list of an EXR header.
    pub fn from_channel_list(list: &ChannelList) -> Self {
        let names: Vec<String> = list.list.iter().map(|c| c.name.to_string()).collect();
        Self::resolve(
            names
                .iter()
                .map(String::as_str)
                .zip(list.list.iter().map(|c| c.sample_type)),
        )
    }

    /// Number of channels.
    pub fn len(&self) -> usize {
        self.file_names.len()
    }

    /// Returns `true` if there are no channels.
    pub fn is_empty(&self) -> bool {
        self.file_names.is_empty()
    }

    /// Canonical position of the file channel called `file_name`.
    pub fn user_index_of(&self, file_name: &str) -> Option<usize> {
        self.file_names
            .iter()
            .position(|name| name == file_name)
            .map(|index| self.user_index[index])
    }

    /// File channels whose samples are narrowed when delivered as half.
    pub fn narrowed(&self) -> impl Iterator<Item = (&str, SampleType)> + '_ {
        self.file_names
            .iter()
            .zip(&self.file_types)
            .filter(|(_, sample_type)| **sample_type != SampleType::F16)
            .map(|(name, sample_type)| (name.as_str(), *sample_type))
    }

    /// Writes channel count, names and alpha/depth indices into `spec`.
    pub fn apply(&self, spec: &mut FormatSpec) {
        spec.nchannels = self.names.len();
        spec.channelnames = self.names.clone();
        spec.alpha_channel = self.alpha;
        spec.z_channel = self.z;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn halves(names: &[&'static str]) -> ChannelMap {
        ChannelMap::resolve(names.iter().map(|&n| (n, SampleType::F16)))
    }

    fn is_permutation(indices: &[usize]) -> bool {
        let mut sorted = indices.to_vec();
        sorted.sort_unstable();
        sorted.iter().copied().eq(0..indices.len())
    }

    #[test]
    fn test_rgba() {
        let map = halves(&["A", "B", "G", "R"]);
        assert_eq!(map.names, ["R", "G", "B", "A"]);
        assert_eq!(map.user_index, [3, 2, 1, 0]);
        assert_eq!(map.alpha, Some(3));
        assert_eq!(map.z, None);
    }

    #[test]
    fn test_extra_channels_follow() {
        let map = halves(&["B", "G", "R", "Z", "extra"]);
        assert_eq!(map.names, ["R", "G", "B", "Z", "extra"]);
        assert_eq!(map.user_index, [2, 1, 0, 3, 4]);
        assert_eq!(map.z, Some(3));
        assert_eq!(map.alpha, None);
    }

    #[test]
    fn test_long_names_case_insensitive() {
        let map = halves(&["alpha", "BLUE", "green", "Red", "z"]);
        assert_eq!(map.names, ["R", "G", "B", "A", "Z"]);
        assert_eq!(map.user_index_of("Red"), Some(0));
        assert_eq!(map.user_index_of("alpha"), Some(3));
        assert_eq!(map.user_index_of("z"), Some(4));
        assert_eq!(map.user_index_of("missing"), None);
    }

    #[test]
    fn test_later_duplicate_wins() {
        let map = halves(&["R", "Red"]);
        assert_eq!(map.names, ["R", "R"]);
        // "Red" claims the red slot, "R" falls through as an ordinary channel
        assert_eq!(map.user_index, [1, 0]);
    }

    #[test]
    fn test_no_recognized_channels() {
        let map = halves(&["Y", "depth.Z", "mask"]);
        assert_eq!(map.names, ["Y", "depth.Z", "mask"]);
        assert_eq!(map.user_index, [0, 1, 2]);
    }

    #[test]
    fn test_permutation_invariant() {
        for names in [
            &["A", "B", "G", "R", "Z", "u", "v"][..],
            &["v", "u", "Green"][..],
            &[][..],
        ] {
            let map = halves(names);
            assert_eq!(map.names.len(), map.len());
            assert!(is_permutation(&map.user_index), "{names:?}");
        }
    }

    #[test]
    fn test_apply_to_spec() {
        let map = halves(&["A", "B", "G", "R"]);
        let mut spec = FormatSpec::default();
        map.apply(&mut spec);
        assert_eq!(spec.nchannels, 4);
        assert_eq!(spec.channelnames, ["R", "G", "B", "A"]);
        assert_eq!(spec.alpha_channel, Some(3));
        assert_eq!(spec.channelnames[3], "A");
    }

    #[test]
    fn test_narrowed() {
        let map = ChannelMap::resolve([
            ("B", SampleType::F16),
            ("G", SampleType::F32),
            ("id", SampleType::U32),
        ]);
        let narrowed: Vec<_> = map.narrowed().map(|(name, _)| name).collect();
        assert_eq!(narrowed, ["G", "id"]);
    }
}

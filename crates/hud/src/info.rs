use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Mesh name to on-screen description, shown when the player looks at it.
///
/// Read-only once built. BTreeMap keeps listings and validation reports
/// in a stable order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InfoTable {
    entries: BTreeMap<String, String>,
}

impl InfoTable {
    pub fn new(entries: BTreeMap<String, String>) -> Self {
        Self { entries }
    }

    pub fn empty() -> Self {
        Self::new(BTreeMap::new())
    }

    pub fn get(&self, mesh_name: &str) -> Option<&str> {
        self.entries.get(mesh_name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Keys that name no mesh in `mesh_names`.
    pub fn validate<'a>(&self, mesh_names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        let known: std::collections::BTreeSet<&str> = mesh_names.into_iter().collect();
        self.entries
            .keys()
            .filter(|k| !known.contains(k.as_str()))
            .cloned()
            .collect()
    }
}

impl Default for InfoTable {
    /// The crime-scene room's descriptions.
    fn default() -> Self {
        let pairs: &[(&str, &str)] = &[
            ("chair", "Chair\nIt's literally just a chair"),
            ("table", "Table\nNormally you'd put stuff on top of this thing"),
            (
                "monitor",
                "Monitor\nThe new high-tech monitor available for only $1,000,000,000",
            ),
            ("keyboard", "Keyboard\nYour average keyboard"),
            ("mouse", "Mouse\nNo, this is not the animal"),
            ("mouse_pad", "Mouse Pad\nKeeps your mouse's feet nice and clean"),
            ("textbook", "Textbook\nFor all your studying needs"),
            ("books", "Books\nSomeone does a bit of reading"),
            (
                "pencil_holder",
                "Pencil Holder\nYou don't want those writing materials all over your desk, do you?",
            ),
            ("desk", "Desk\nIt's just a desk"),
            ("shelf", "Shelf\nA mysterious structure used to hold stuff"),
            (
                "door",
                "Door\nMake sure not to slam into this one, it hurts, don't ask why I know",
            ),
            ("door_knob", "Door Knob\nHow else are you gonna open the door?"),
            ("bed", "Bed\nSuspected location of victim's death"),
            (
                "pillow",
                "Pillow\nMessy placement of pillows indicates that the suspect likely dragged the victim's body out of bed",
            ),
            (
                "blood_puddle",
                "Blood Puddle\nLikely left behind from the body lying there for a period of time",
            ),
            (
                "muddy_footprint",
                "Muddy Footprint\nIndicates that the suspect must have entered through the window",
            ),
            (
                "bloody_handprint",
                "Bloody Handprint\nThe suspect may have touched the inside of the window on their way out",
            ),
            ("knife", "Knife\nLikely the weapon used to commit the murder"),
            ("blanket", "Blanket\nThe blanket used to wrap the dead body"),
            ("right_foot", "Dead Body\nThe victim's body"),
            ("left_foot", "Dead Body\nThe victim's body"),
            (
                "inner_window_primitive1",
                "Window\nSuspected mode of entry and exit",
            ),
            (
                "outer_window_primitive1",
                "Window\nSuspected mode of entry and exit",
            ),
        ];
        Self::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }
}

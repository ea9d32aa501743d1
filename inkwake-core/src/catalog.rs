//! Status image catalog
//!
//! Built-in images the device can show without the server: the boot splash,
//! the low battery warning, and whatever screensavers the server may name by
//! identifier. The table is sorted by identifier at build time so lookups are
//! a binary search.

use inkwake_protocol::ImageId;

/// Catalog construction errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CatalogError {
    /// Identifiers are not strictly ascending at this index
    Unsorted(usize),
    /// A kind points past the end of the table
    MissingKind(StatusImageKind),
}

/// Images the firmware itself needs, independent of the server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StatusImageKind {
    /// Shown at cold boot and after an interrupted download
    Initial,
    /// Shown once, right before halting on a flat battery
    LowBattery,
}

/// One built-in image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusImage {
    pub id: ImageId,
    /// Encoded PNG or JPEG
    pub data: &'static [u8],
}

/// Sorted table of status images plus the index of each [`StatusImageKind`]
#[derive(Debug, Clone, Copy)]
pub struct StatusCatalog {
    images: &'static [StatusImage],
    initial: usize,
    low_battery: usize,
}

impl StatusCatalog {
    /// Wrap a table whose identifiers are strictly ascending
    pub fn new(
        images: &'static [StatusImage],
        initial: usize,
        low_battery: usize,
    ) -> Result<Self, CatalogError> {
        if let Some(pos) = images.windows(2).position(|pair| pair[0].id >= pair[1].id) {
            return Err(CatalogError::Unsorted(pos + 1));
        }
        if initial >= images.len() {
            return Err(CatalogError::MissingKind(StatusImageKind::Initial));
        }
        if low_battery >= images.len() {
            return Err(CatalogError::MissingKind(StatusImageKind::LowBattery));
        }
        Ok(Self {
            images,
            initial,
            low_battery,
        })
    }

    /// Position of the image with exactly this identifier
    pub fn find(&self, id: &ImageId) -> Option<usize> {
        self.images.binary_search_by(|image| image.id.cmp(id)).ok()
    }

    /// Image with this identifier, if the catalog has one
    pub fn by_id(&self, id: &ImageId) -> Option<&StatusImage> {
        self.find(id).map(|index| &self.images[index])
    }

    /// The image serving `kind`
    pub fn by_kind(&self, kind: StatusImageKind) -> &StatusImage {
        let index = match kind {
            StatusImageKind::Initial => self.initial,
            StatusImageKind::LowBattery => self.low_battery,
        };
        &self.images[index]
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkwake_protocol::IMAGE_ID_LEN;

    const fn id(first: u8, last: u8) -> ImageId {
        let mut id = [0u8; IMAGE_ID_LEN];
        id[0] = first;
        id[IMAGE_ID_LEN - 1] = last;
        id
    }

    static IMAGES: [StatusImage; 4] = [
        StatusImage { id: id(1, 0), data: b"a" },
        StatusImage { id: id(1, 9), data: b"b" },
        StatusImage { id: id(7, 3), data: b"c" },
        StatusImage { id: id(200, 0), data: b"d" },
    ];

    #[test]
    fn test_find_every_entry() {
        let catalog = StatusCatalog::new(&IMAGES, 0, 3).unwrap();
        for (k, image) in IMAGES.iter().enumerate() {
            assert_eq!(catalog.find(&image.id), Some(k));
        }
    }

    #[test]
    fn test_find_missing() {
        let catalog = StatusCatalog::new(&IMAGES, 0, 3).unwrap();
        assert_eq!(catalog.find(&id(0, 0)), None);
        assert_eq!(catalog.find(&id(1, 5)), None);
        assert_eq!(catalog.find(&id(255, 255)), None);
        assert!(catalog.by_id(&id(7, 4)).is_none());
    }

    #[test]
    fn test_by_kind() {
        let catalog = StatusCatalog::new(&IMAGES, 2, 1).unwrap();
        assert_eq!(catalog.by_kind(StatusImageKind::Initial).data, b"c");
        assert_eq!(catalog.by_kind(StatusImageKind::LowBattery).data, b"b");
    }

    #[test]
    fn test_rejects_unsorted() {
        static SWAPPED: [StatusImage; 2] = [
            StatusImage { id: id(2, 0), data: b"" },
            StatusImage { id: id(1, 0), data: b"" },
        ];
        static DUPLICATE: [StatusImage; 2] = [
            StatusImage { id: id(1, 0), data: b"" },
            StatusImage { id: id(1, 0), data: b"" },
        ];
        assert_eq!(
            StatusCatalog::new(&SWAPPED, 0, 0).err(),
            Some(CatalogError::Unsorted(1))
        );
        assert_eq!(
            StatusCatalog::new(&DUPLICATE, 0, 0).err(),
            Some(CatalogError::Unsorted(1))
        );
    }

    #[test]
    fn test_rejects_missing_kind() {
        assert_eq!(
            StatusCatalog::new(&IMAGES, 4, 0).err(),
            Some(CatalogError::MissingKind(StatusImageKind::Initial))
        );
        assert_eq!(
            StatusCatalog::new(&IMAGES[..0], 0, 0).err(),
            Some(CatalogError::MissingKind(StatusImageKind::Initial))
        );
    }
}

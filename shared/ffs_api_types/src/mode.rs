use bitflags::bitflags;

bitflags! {
    /// Access and disposition flags for `open`.
    ///
    /// With none of the disposition bits set the file must already exist.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct OpenMode: u8 {
        const READ          = 0x01;
        const WRITE         = 0x02;
        /// Create a new file; fail with `FR_EXIST` if it is already there.
        const CREATE_NEW    = 0x04;
        /// Create a new file, truncating an existing one.
        const CREATE_ALWAYS = 0x08;
        /// Open the file, creating it if missing.
        const OPEN_ALWAYS   = 0x10;
        /// Like `OPEN_ALWAYS`, with the cursor placed at the end of the file.
        const OPEN_APPEND   = 0x30;
    }
}

impl OpenMode {
    /// Any flag that may modify the file or the directory holding it.
    pub fn modifies(self) -> bool {
        self.intersects(
            OpenMode::WRITE | OpenMode::CREATE_NEW | OpenMode::CREATE_ALWAYS | OpenMode::OPEN_ALWAYS,
        )
    }

    /// The mode the example uses: fresh file, read and write access.
    pub const fn read_write_truncate() -> Self {
        OpenMode::CREATE_ALWAYS.union(OpenMode::WRITE).union(OpenMode::READ)
    }
}

use crate::markdown::Document;

impl Document {
    /// Saves the classified blocks to a JSON file for inspection.
    ///
    /// Each block is written as an object tagged with its `type`; paragraphs include both the
    /// raw line and the styled runs the DOCX renderer will emit.
    ///
    /// # Example
    /// ```no_run
    /// use assignment2doc::Document;
    ///
    /// let document = Document::parse("# Title\nSome **bold** text");
    /// document.save_to_json_file("blocks.json").unwrap();
    /// ```
    pub fn save_to_json_file(&self, file_path: &str) -> std::io::Result<()> {
        let json_content = self.to_readable_json()?;
        std::fs::write(file_path, json_content)?;
        Ok(())
    }

    /// Pretty-printed JSON array of the blocks.
    pub fn to_readable_json(&self) -> std::io::Result<String> {
        serde_json::to_string_pretty(self.blocks()).map_err(std::io::Error::other)
    }
}

#[cfg(test)]
mod debug_tests {
    use super::*;
    use serde_json::Value;
    use tempfile::tempdir;

    #[test]
    fn test_readable_json_shape() {
        let document = Document::parse("# Title\n\n- item\n3. third\n[IMAGE: x.png]\nSome **bold** text");
        let json = document.to_readable_json().unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        let blocks = value.as_array().unwrap();
        assert_eq!(blocks.len(), 6);
        assert_eq!(blocks[0]["type"], "Heading");
        assert_eq!(blocks[0]["level"], 1);
        assert_eq!(blocks[0]["text"], "Title");
        assert_eq!(blocks[1]["type"], "Blank");
        assert_eq!(blocks[2]["type"], "BulletItem");
        assert_eq!(blocks[3]["number"], "3");
        assert_eq!(blocks[4]["target"], "x.png");
        assert_eq!(blocks[5]["raw"], "Some **bold** text");
        assert_eq!(blocks[5]["runs"][1]["text"], "bold");
        assert_eq!(blocks[5]["runs"][1]["bold"], true);
    }

    #[test]
    fn test_save_to_json_file_writes_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("blocks.json");
        Document::parse("File test")
            .save_to_json_file(path.to_str().unwrap())
            .unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("File test"));
        assert!(content.contains("\"Paragraph\""));
    }
}

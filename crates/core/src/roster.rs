#![allow(missing_docs)]

//! Class rosters for the elementary, middle and high school sections.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    error::EditError,
    grid::CellPosition,
    models::SchoolLevel,
    table::{self, RecordRow},
};

/// One class card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassInfo {
    /// Section-local id, also the key of the student list.
    pub table_id: u32,
    /// Grade level shown on the card.
    pub current_level: u8,
    /// Class name.
    #[serde(default)]
    pub class_name: String,
    /// Teacher in charge.
    #[serde(default)]
    pub teacher: String,
}

/// One student row of a class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRow {
    /// Class-local id.
    pub student_id: u32,
    /// Position at creation time.
    #[serde(default)]
    pub idx: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub school: String,
    #[serde(default)]
    pub grade: String,
}

impl RecordRow for StudentRow {
    const COLUMNS: &'static [&'static str] = &["이름", "학교", "학년"];

    fn row_id(&self) -> u32 {
        self.student_id
    }

    fn field(&self, col: usize) -> Option<&str> {
        match col {
            0 => Some(&self.name),
            1 => Some(&self.school),
            2 => Some(&self.grade),
            _ => None,
        }
    }

    fn field_mut(&mut self, col: usize) -> Option<&mut String> {
        match col {
            0 => Some(&mut self.name),
            1 => Some(&mut self.school),
            2 => Some(&mut self.grade),
            _ => None,
        }
    }
}

/// Students of one class plus their id counter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassStudents {
    #[serde(default)]
    pub students: Vec<StudentRow>,
    #[serde(default)]
    pub next_student_id: u32,
}

/// A roster section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassSection {
    /// Class cards in display order.
    #[serde(default)]
    pub classes: Vec<ClassInfo>,
    /// Next class id.
    #[serde(default)]
    pub next_id: u32,
    /// Student lists keyed by class id.
    #[serde(default)]
    pub students_data: BTreeMap<u32, ClassStudents>,
}

impl ClassSection {
    /// Class by id.
    pub fn class(&self, table_id: u32) -> Option<&ClassInfo> {
        self.classes.iter().find(|class| class.table_id == table_id)
    }

    fn class_mut(&mut self, table_id: u32) -> Result<&mut ClassInfo, EditError> {
        self.classes
            .iter_mut()
            .find(|class| class.table_id == table_id)
            .ok_or(EditError::UnknownTable(table_id))
    }

    /// Open a new level-1 class with an empty student list.
    pub fn add_class(&mut self) -> u32 {
        let id = self.next_id;
        self.classes.push(ClassInfo {
            table_id: id,
            current_level: 1,
            class_name: String::new(),
            teacher: String::new(),
        });
        self.students_data.insert(id, ClassStudents::default());
        self.next_id += 1;
        id
    }

    /// Remove a class and its student list.
    pub fn delete_class(&mut self, table_id: u32) -> Result<(), EditError> {
        let index = self
            .classes
            .iter()
            .position(|class| class.table_id == table_id)
            .ok_or(EditError::UnknownTable(table_id))?;
        self.classes.remove(index);
        self.students_data.remove(&table_id);
        info!(table_id, "deleted class");
        Ok(())
    }

    /// Set the level, clamped to `1..=school.max_grade()`.
    pub fn set_level(
        &mut self,
        table_id: u32,
        level: u8,
        school: SchoolLevel,
    ) -> Result<(), EditError> {
        let class = self.class_mut(table_id)?;
        class.current_level = level.clamp(1, school.max_grade());
        Ok(())
    }

    /// Advance the level by one, wrapping after the school's last grade.
    pub fn cycle_level(&mut self, table_id: u32, school: SchoolLevel) -> Result<u8, EditError> {
        let class = self.class_mut(table_id)?;
        let max = school.max_grade();
        class.current_level = (class.current_level % max) + 1;
        Ok(class.current_level)
    }

    /// Update the name and teacher of a class.
    pub fn set_class_info(
        &mut self,
        table_id: u32,
        class_name: &str,
        teacher: &str,
    ) -> Result<(), EditError> {
        let class = self.class_mut(table_id)?;
        class.class_name = class_name.to_string();
        class.teacher = teacher.to_string();
        Ok(())
    }

    /// Stable sort by level, then renumber ids `0..n` and re-key the student
    /// lists to match.
    pub fn sort_by_level(&mut self) {
        let mut classes = std::mem::take(&mut self.classes);
        classes.sort_by_key(|class| class.current_level);

        let mut students = std::mem::take(&mut self.students_data);
        for (index, class) in classes.iter_mut().enumerate() {
            let new_id = index as u32;
            if let Some(list) = students.remove(&class.table_id) {
                self.students_data.insert(new_id, list);
            }
            class.table_id = new_id;
        }
        self.next_id = classes.len() as u32;
        self.classes = classes;
    }

    /// Classes whose level is listed, in display order.
    pub fn classes_at_levels(&self, levels: &[u8]) -> Vec<&ClassInfo> {
        self.classes
            .iter()
            .filter(|class| levels.contains(&class.current_level))
            .collect()
    }

    /// Students of a class; empty when the class has no list.
    pub fn students(&self, table_id: u32) -> &[StudentRow] {
        self.students_data
            .get(&table_id)
            .map(|list| list.students.as_slice())
            .unwrap_or(&[])
    }

    fn students_mut(&mut self, table_id: u32) -> Result<&mut ClassStudents, EditError> {
        if self.class(table_id).is_none() {
            return Err(EditError::UnknownTable(table_id));
        }
        Ok(self.students_data.entry(table_id).or_default())
    }

    /// Append a blank student; returns its id.
    pub fn add_student(&mut self, table_id: u32) -> Result<u32, EditError> {
        let list = self.students_mut(table_id)?;
        let id = list.next_student_id;
        list.students.push(StudentRow {
            student_id: id,
            idx: list.students.len() as u32,
            name: String::new(),
            school: String::new(),
            grade: String::new(),
        });
        list.next_student_id += 1;
        Ok(id)
    }

    /// Remove a student.
    pub fn delete_student(&mut self, table_id: u32, student_id: u32) -> Result<(), EditError> {
        let list = self.students_mut(table_id)?;
        table::remove_row(&mut list.students, student_id)?;
        Ok(())
    }

    /// Edit one student field (0 name, 1 school, 2 grade).
    pub fn set_student_field(
        &mut self,
        table_id: u32,
        student_id: u32,
        col: usize,
        value: &str,
    ) -> Result<(), EditError> {
        let list = self.students_mut(table_id)?;
        table::set_field(&mut list.students, student_id, col, value)
    }

    /// Blank the addressed student cells.
    pub fn clear_student_cells(
        &mut self,
        table_id: u32,
        positions: &[CellPosition],
    ) -> Result<usize, EditError> {
        let list = self.students_mut(table_id)?;
        Ok(table::clear_fields(&mut list.students, positions))
    }

    /// Every student of the section, list by list in id order.
    pub fn all_students(&self) -> impl Iterator<Item = &StudentRow> {
        self.students_data
            .values()
            .flat_map(|list| list.students.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adding_and_deleting_classes_tracks_student_lists() -> anyhow::Result<()> {
        let mut section = ClassSection::default();
        let a = section.add_class();
        let b = section.add_class();
        assert_eq!((a, b), (0, 1));
        section.add_student(b)?;
        section.delete_class(b)?;
        assert!(section.students_data.get(&b).is_none());
        assert_eq!(section.next_id, 2);
        assert_eq!(section.delete_class(b), Err(EditError::UnknownTable(1)));
        Ok(())
    }

    #[test]
    fn level_cycles_within_school_range() -> anyhow::Result<()> {
        let mut section = ClassSection::default();
        let id = section.add_class();
        section.set_level(id, 3, SchoolLevel::Middle)?;
        assert_eq!(section.cycle_level(id, SchoolLevel::Middle)?, 1);
        section.set_level(id, 9, SchoolLevel::Elementary)?;
        assert_eq!(section.class(id).map(|c| c.current_level), Some(6));
        assert_eq!(section.cycle_level(id, SchoolLevel::Elementary)?, 1);
        assert_eq!(section.cycle_level(id, SchoolLevel::Elementary)?, 2);
        Ok(())
    }

    #[test]
    fn sorting_renumbers_and_moves_students() -> anyhow::Result<()> {
        let mut section = ClassSection::default();
        let high = section.add_class();
        let low = section.add_class();
        section.set_level(high, 5, SchoolLevel::Elementary)?;
        section.set_level(low, 2, SchoolLevel::Elementary)?;
        let student = section.add_student(high)?;
        section.set_student_field(high, student, 0, "민수")?;

        section.sort_by_level();
        assert_eq!(section.classes[0].current_level, 2);
        assert_eq!(section.classes[1].table_id, 1);
        assert_eq!(section.students(1)[0].name, "민수");
        assert!(section.students(0).is_empty());
        assert_eq!(section.next_id, 2);
        Ok(())
    }

    #[test]
    fn level_filter_keeps_order() -> anyhow::Result<()> {
        let mut section = ClassSection::default();
        for level in [3, 1, 3] {
            let id = section.add_class();
            section.set_level(id, level, SchoolLevel::High)?;
        }
        let ids: Vec<u32> = section
            .classes_at_levels(&[3])
            .iter()
            .map(|c| c.table_id)
            .collect();
        assert_eq!(ids, vec![0, 2]);
        Ok(())
    }

    #[test]
    fn student_edits_and_clears() -> anyhow::Result<()> {
        let mut section = ClassSection::default();
        let class = section.add_class();
        let first = section.add_student(class)?;
        let second = section.add_student(class)?;
        section.set_student_field(class, first, 1, "한빛초")?;
        section.set_student_field(class, second, 2, "4")?;
        assert_eq!(section.students(class)[1].idx, 1);

        let cleared =
            section.clear_student_cells(class, &[CellPosition::new(0, 1), CellPosition::new(1, 2)])?;
        assert_eq!(cleared, 2);
        section.delete_student(class, first)?;
        assert_eq!(section.students(class).len(), 1);
        assert_eq!(section.add_student(7), Err(EditError::UnknownTable(7)));
        Ok(())
    }

    #[test]
    fn student_lists_use_numeric_string_keys() -> anyhow::Result<()> {
        let mut section = ClassSection::default();
        let id = section.add_class();
        section.add_student(id)?;
        let json = serde_json::to_value(&section)?;
        assert!(json["studentsData"]["0"]["students"].is_array());
        let back: ClassSection = serde_json::from_value(json)?;
        assert_eq!(back, section);
        Ok(())
    }
}

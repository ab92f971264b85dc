// src/store/assessments.rs

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use chrono::Utc;

use super::{read, write};
use crate::{
    error::AppError,
    models::assessment::{Assessment, CreateAssessmentRequest},
};

#[derive(Default)]
struct AssessmentTable {
    last_id: i64,
    rows: BTreeMap<i64, Arc<Assessment>>,
}

/// Read-mostly assessment catalog. Definitions are immutable once stored.
#[derive(Clone, Default)]
pub struct AssessmentStore {
    table: Arc<RwLock<AssessmentTable>>,
}

impl AssessmentStore {
    pub fn create(&self, payload: CreateAssessmentRequest) -> Result<Arc<Assessment>, AppError> {
        let mut table = write(&self.table);
        let id = table.last_id + 1;
        let assessment = Arc::new(
            payload
                .into_assessment(id, Utc::now())
                .map_err(AppError::BadRequest)?,
        );
        table.last_id = id;
        table.rows.insert(id, Arc::clone(&assessment));
        Ok(assessment)
    }

    pub fn get(&self, id: i64) -> Result<Arc<Assessment>, AppError> {
        read(&self.table)
            .rows
            .get(&id)
            .cloned()
            .ok_or(AppError::NotFound(format!("Assessment {} not found", id)))
    }

    pub fn list(&self) -> Vec<Arc<Assessment>> {
        read(&self.table).rows.values().cloned().collect()
    }

    /// Distinct skills, lowercase.
    pub fn skills(&self) -> Vec<String> {
        let mut skills: Vec<String> = read(&self.table)
            .rows
            .values()
            .map(|a| a.skill.to_lowercase())
            .collect();
        skills.sort();
        skills.dedup();
        skills
    }

    pub fn delete(&self, id: i64) -> Result<(), AppError> {
        write(&self.table)
            .rows
            .remove(&id)
            .map(|_| ())
            .ok_or(AppError::NotFound(format!("Assessment {} not found", id)))
    }
}

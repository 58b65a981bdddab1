use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, Regex};
use mongodb::Database;

use crate::config::CollectionNames;
use crate::models::student::{
    CreateStudentRequest, ListStudentsQuery, Student, StudentResponse, UpdateStudentRequest,
};
use crate::utils::time::chrono_to_bson;

pub struct StudentService {
    mongo: Database,
    collections: CollectionNames,
}

impl StudentService {
    pub fn new(mongo: Database, collections: CollectionNames) -> Self {
        Self { mongo, collections }
    }

    fn users(&self) -> mongodb::Collection<Student> {
        self.mongo.collection::<Student>(&self.collections.users)
    }

    /// Full role-filtered scan for the snapshot. Assumes the result set fits
    /// one page; large deployments inherit that gap from the original design.
    pub async fn scan_all(&self) -> Result<Vec<Student>> {
        let cursor = self
            .users()
            .find(doc! { "role": "student" })
            .await
            .context("Failed to scan students")?;
        cursor
            .try_collect()
            .await
            .context("Failed to collect students")
    }

    /// Filtered listing for the student management tab.
    pub async fn list(&self, query: ListStudentsQuery) -> Result<Vec<StudentResponse>> {
        let mut filter = doc! { "role": "student" };

        if let Some(college) = query.college {
            filter.insert("college", college);
        }

        if let Some(search) = query.search {
            // search by email or name (case-insensitive)
            let regex = Regex {
                pattern: search,
                options: "i".to_string(),
            };
            filter.insert(
                "$or",
                vec![doc! { "email": &regex }, doc! { "name": &regex }],
            );
        }

        let limit = query.limit.unwrap_or(50).min(100) as i64;
        let offset = query.offset.unwrap_or(0) as u64;

        let mut cursor = self
            .users()
            .find(filter)
            .skip(offset)
            .limit(limit)
            .await
            .context("Failed to query students")?;

        let mut students = Vec::new();
        while cursor.advance().await.context("Failed to advance cursor")? {
            let student = cursor
                .deserialize_current()
                .context("Failed to deserialize student")?;
            students.push(StudentResponse::from(student));
        }

        Ok(students)
    }

    pub async fn create(&self, req: CreateStudentRequest) -> Result<StudentResponse> {
        let users = self.users();

        let existing = users
            .find_one(doc! { "email": &req.email })
            .await
            .context("Failed to check existing student")?;
        if existing.is_some() {
            return Err(anyhow!("Student with this email already exists"));
        }

        let now = Utc::now();
        let student = Student {
            id: None,
            email: req.email,
            name: req.name,
            role: "student".to_string(),
            password: req.password,
            college: req.college,
            created_at: Some(now),
            updated_at: Some(now),
        };

        let inserted = users
            .insert_one(&student)
            .await
            .context("Failed to insert student")?;
        let student_id = inserted
            .inserted_id
            .as_object_id()
            .ok_or_else(|| anyhow!("Failed to get inserted student ID"))?;

        let created = users
            .find_one(doc! { "_id": student_id })
            .await
            .context("Failed to fetch created student")?
            .ok_or_else(|| anyhow!("Student not found after creation"))?;

        Ok(StudentResponse::from(created))
    }

    pub async fn update(
        &self,
        student_id: &str,
        req: UpdateStudentRequest,
    ) -> Result<StudentResponse> {
        let users = self.users();
        let object_id = ObjectId::parse_str(student_id).context("Invalid student ID format")?;

        let mut update_doc = doc! {
            "$set": {
                "updatedAt": chrono_to_bson(Utc::now()),
            }
        };

        if let Some(name) = req.name {
            update_doc.get_document_mut("$set")?.insert("name", name);
        }
        if let Some(college) = req.college {
            update_doc
                .get_document_mut("$set")?
                .insert("college", college);
        }
        if let Some(password) = req.password {
            update_doc
                .get_document_mut("$set")?
                .insert("password", password);
        }

        let result = users
            .update_one(doc! { "_id": object_id, "role": "student" }, update_doc)
            .await
            .context("Failed to update student")?;
        if result.matched_count == 0 {
            return Err(anyhow!("Student not found"));
        }

        let updated = users
            .find_one(doc! { "_id": object_id })
            .await
            .context("Failed to fetch updated student")?
            .ok_or_else(|| anyhow!("Student not found"))?;

        Ok(StudentResponse::from(updated))
    }

    pub async fn delete(&self, student_id: &str) -> Result<()> {
        let object_id = ObjectId::parse_str(student_id).context("Invalid student ID format")?;

        let result = self
            .users()
            .delete_one(doc! { "_id": object_id, "role": "student" })
            .await
            .context("Failed to delete student")?;
        if result.deleted_count == 0 {
            return Err(anyhow!("Student not found"));
        }

        Ok(())
    }
}

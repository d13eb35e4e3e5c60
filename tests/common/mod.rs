//! Shared test utilities and HR fixture generators

#![allow(dead_code)]

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use polars::prelude::*;
use tempfile::TempDir;
use ::zip::write::SimpleFileOptions;
use ::zip::ZipWriter;

/// Working days written to the clock fixtures
pub const CLOCK_DAYS: [&str; 4] = ["2015-01-01", "2015-01-02", "2015-01-05", "2015-01-06"];

/// Every fourth employee leaves
pub fn attrited(id: usize) -> bool {
    id % 4 == 0
}

/// Leavers are younger, travel more and work longer days
pub fn general_csv(n: usize) -> String {
    let mut out = String::from(
        "Age,Attrition,BusinessTravel,Department,DistanceFromHome,Education,EducationField,EmployeeCount,\
EmployeeID,Gender,JobLevel,JobRole,MaritalStatus,MonthlyIncome,NumCompaniesWorked,Over18,PercentSalaryHike,\
StandardHours,StockOptionLevel,TotalWorkingYears,TrainingTimesLastYear,YearsAtCompany,\
YearsSinceLastPromotion,YearsWithCurrManager\n",
    );
    for id in 1..=n {
        let left = attrited(id);
        let age = if left { 22 + id % 6 } else { 32 + id % 20 };
        let travel = if left { "Travel_Frequently" } else if id % 3 == 0 { "Non-Travel" } else { "Travel_Rarely" };
        let department = ["Sales", "Research & Development", "Human Resources"][id % 3];
        let field = ["Life Sciences", "Medical", "Marketing"][id % 3];
        let gender = if id % 2 == 0 { "Male" } else { "Female" };
        let level = 1 + id % 4;
        let role = ["Sales Executive", "Research Scientist", "Manager"][id % 3];
        let marital = if left { "Single" } else { ["Married", "Divorced"][id % 2] };
        let income = 20000 + level * 15000 + id * 37;
        // A few missing answers in numeric general columns
        let companies = if id % 11 == 0 { "NA".to_string() } else { (id % 5).to_string() };
        let total_years = if left { 2 + id % 3 } else { 8 + id % 12 };
        let at_company = total_years.min(1 + id % 7);
        let since_promotion = at_company.min(id % 4);
        let with_manager = at_company.min(id % 5);
        out.push_str(&format!(
            "{age},{},{travel},{department},{},{},{field},1,{id},{gender},{level},{role},{marital},{income},\
{companies},Y,{},8,{},{total_years},{},{at_company},{since_promotion},{with_manager}\n",
            if left { "Yes" } else { "No" },
            1 + id % 25,
            1 + id % 5,
            11 + id % 14,
            id % 4,
            id % 6,
        ));
    }
    out
}

pub fn manager_survey_csv(n: usize) -> String {
    let mut out = String::from("EmployeeID,JobInvolvement,PerformanceRating\n");
    for id in 1..=n {
        out.push_str(&format!("{},{},{}\n", id, 1 + id % 4, 3 + id % 2));
    }
    out
}

/// Unhappy leavers; every seventh employee skipped a question
pub fn employee_survey_csv(n: usize) -> String {
    let mut out = String::from("EmployeeID,EnvironmentSatisfaction,JobSatisfaction,WorkLifeBalance\n");
    for id in 1..=n {
        let satisfaction = if attrited(id) { 1 + id % 2 } else { 3 + id % 2 };
        let environment = if id % 7 == 0 { "NA".to_string() } else { satisfaction.to_string() };
        out.push_str(&format!("{},{},{},{}\n", id, environment, satisfaction, 1 + id % 4));
    }
    out
}

/// Clock table with an empty first header cell, one column per day
pub fn clock_csv(n: usize, departures: bool) -> String {
    let mut out = format!(",{}\n", CLOCK_DAYS.join(","));
    for id in 1..=n {
        let mut row = id.to_string();
        for (d, day) in CLOCK_DAYS.iter().enumerate() {
            row.push(',');
            // One absence per employee
            if d == id % CLOCK_DAYS.len() {
                row.push_str("NA");
                continue;
            }
            let minute = (id * 7 + d * 13) % 60;
            let stamp = match (departures, attrited(id)) {
                (false, true) => format!("{} 09:{:02}:00", day, minute.max(31)),
                (false, false) => format!("{} 09:{:02}:00", day, minute / 3),
                (true, true) => format!("{} 19:{:02}:00", day, minute),
                (true, false) => format!("{} 17:{:02}:00", day, 30 + minute / 2),
            };
            row.push_str(&stamp);
        }
        out.push_str(&row);
        out.push('\n');
    }
    out
}

pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

/// Write the three HR tables into `dir`
pub fn write_hr_tables(dir: &Path, n: usize) {
    write_file(dir, "general_data.csv", &general_csv(n));
    write_file(dir, "manager_survey_data.csv", &manager_survey_csv(n));
    write_file(dir, "employee_survey_data.csv", &employee_survey_csv(n));
}

/// Write the HR tables plus the paired clock files
pub fn write_hr_dataset(dir: &Path, n: usize) {
    write_hr_tables(dir, n);
    write_file(dir, "in_time.csv", &clock_csv(n, false));
    write_file(dir, "out_time.csv", &clock_csv(n, true));
}

/// Write a zip archive holding the given members
pub fn write_zip(path: &Path, members: &[(&str, &str)]) {
    let file = File::create(path).unwrap();
    let mut writer = ZipWriter::new(file);
    for (name, content) in members {
        writer.start_file(*name, SimpleFileOptions::default()).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap();
}

/// Write the clock tables as `in_out_time.zip` in `dir`
pub fn write_clock_archive(dir: &Path, n: usize) -> PathBuf {
    let path = dir.join("in_out_time.zip");
    let arrivals = clock_csv(n, false);
    let departures = clock_csv(n, true);
    write_zip(
        &path,
        &[("in_out_time/In_Time.csv", &arrivals), ("in_out_time/Out_Time.csv", &departures)],
    );
    path
}

/// A temp directory populated with the full dataset
pub fn create_hr_dir(n: usize) -> TempDir {
    let dir = TempDir::new().unwrap();
    write_hr_dataset(dir.path(), n);
    dir
}

/// Merged-looking frame for the preparation stages
pub fn create_merged_dataframe() -> DataFrame {
    df! {
        "EmployeeID" => [1i64, 2, 3, 4, 5, 6],
        "Age" => [25i64, 41, 33, 29, 52, 38],
        "Attrition" => ["Yes", "No", "No", "Yes", "No", "No"],
        "Department" => ["Sales", "Research & Development", "Sales", "Human Resources", "Sales", "Research & Development"],
        "MonthlyIncome" => [30000i64, 85000, 52000, 41000, 120000, 64000],
        "JobLevel" => [1i64, 3, 2, 1, 4, 2],
        "PercentSalaryHike" => [11i64, 15, 12, 19, 14, 13],
        "TotalWorkingYears" => [Some(3.0f64), Some(18.0), None, Some(6.0), Some(30.0), Some(12.0)],
        "YearsAtCompany" => [1i64, 10, 4, 2, 20, 5],
        "YearsSinceLastPromotion" => [0i64, 3, 1, 2, 8, 1],
        "YearsWithCurrManager" => [1i64, 7, 2, 0, 10, 3],
        "EnvironmentSatisfaction" => ["1", "3", "NA", "2", "4", "3"],
        "EmployeeCount" => [1i64, 1, 1, 1, 1, 1],
        "StandardHours" => [8i64, 8, 8, 8, 8, 8],
        "Over18" => ["Y", "Y", "Y", "Y", "Y", "Y"],
    }
    .unwrap()
}

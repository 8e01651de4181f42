//! Conversions between persistence and transport shapes
//!
//! DTOs never carry relation ids, so converting a DTO into an entity that
//! owns a foreign key takes that id explicitly.

use crate::dto::{CustomerDto, DepartmentDto, EmployeeDto, EmployeeReviewDto, ManagerDto};
use crate::models::{Customer, Department, Employee, EmployeeReview, Manager};

impl From<Customer> for CustomerDto {
    fn from(c: Customer) -> Self {
        Self {
            id: c.id,
            first_name: c.first_name,
            last_name: c.last_name,
        }
    }
}

impl From<CustomerDto> for Customer {
    fn from(dto: CustomerDto) -> Self {
        Self {
            id: dto.id,
            first_name: dto.first_name,
            last_name: dto.last_name,
        }
    }
}

impl From<Department> for DepartmentDto {
    fn from(d: Department) -> Self {
        Self { id: d.id, name: d.name }
    }
}

impl From<DepartmentDto> for Department {
    fn from(dto: DepartmentDto) -> Self {
        Self {
            id: dto.id,
            name: dto.name,
        }
    }
}

impl From<Manager> for ManagerDto {
    fn from(m: Manager) -> Self {
        Self {
            id: m.id,
            first_name: m.first_name,
            last_name: m.last_name,
        }
    }
}

impl From<ManagerDto> for Manager {
    fn from(dto: ManagerDto) -> Self {
        Self {
            id: dto.id,
            first_name: dto.first_name,
            last_name: dto.last_name,
        }
    }
}

impl From<Employee> for EmployeeDto {
    fn from(e: Employee) -> Self {
        Self {
            id: e.id,
            first_name: e.first_name,
            last_name: e.last_name,
            hire_date: e.hire_date,
            job_title: e.job_title,
            salary_per_month: e.salary_per_month,
        }
    }
}

impl EmployeeDto {
    pub fn into_entity(self, department_id: i64) -> Employee {
        Employee {
            id: self.id,
            first_name: self.first_name,
            last_name: self.last_name,
            hire_date: self.hire_date,
            job_title: self.job_title,
            salary_per_month: self.salary_per_month,
            department_id,
        }
    }
}

impl From<EmployeeReview> for EmployeeReviewDto {
    fn from(r: EmployeeReview) -> Self {
        Self {
            id: r.id,
            rating: r.rating,
            title: r.title,
            content: r.content,
        }
    }
}

impl EmployeeReviewDto {
    pub fn into_entity(self, employee_id: i64, customer_id: i64) -> EmployeeReview {
        EmployeeReview {
            id: self.id,
            rating: self.rating,
            title: self.title,
            content: self.content,
            employee_id,
            customer_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_customer_round_trip() {
        let customer = Customer { id: 7, first_name: "Ada".into(), last_name: "Lovelace".into() };
        let back = Customer::from(CustomerDto::from(customer.clone()));
        assert_eq!(back, customer);
    }

    #[test]
    fn test_department_and_manager_round_trip() {
        let department = Department { id: 3, name: "Research".into() };
        assert_eq!(Department::from(DepartmentDto::from(department.clone())), department);

        let manager = Manager { id: 4, first_name: "Grace".into(), last_name: "Hopper".into() };
        assert_eq!(Manager::from(ManagerDto::from(manager.clone())), manager);
    }

    #[test]
    fn test_employee_round_trip_keeps_department() {
        let employee = Employee {
            id: 11,
            first_name: "Alan".into(),
            last_name: "Turing".into(),
            hire_date: NaiveDate::from_ymd_opt(2023, 6, 23)
                .and_then(|d| d.and_hms_opt(8, 30, 0))
                .unwrap(),
            job_title: "Cryptanalyst".into(),
            salary_per_month: 4200,
            department_id: 2,
        };
        let back = EmployeeDto::from(employee.clone()).into_entity(employee.department_id);
        assert_eq!(back, employee);
    }

    #[test]
    fn test_review_round_trip_keeps_references() {
        let review = EmployeeReview {
            id: 5,
            rating: 4,
            title: "Solid support".into(),
            content: "Answered every question within the hour.".into(),
            employee_id: 11,
            customer_id: 7,
        };
        let back = EmployeeReviewDto::from(review.clone()).into_entity(11, 7);
        assert_eq!(back, review);
    }
}

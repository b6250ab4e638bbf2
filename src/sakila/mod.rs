//! Menu actions over the Sakila DVD rental sample database.

use crate::console::Console;
use crate::db::{Database, int_cell, text_cell};
use crate::menu::Menu;
use crate::pager::browse;
use anyhow::{Context, Result};
use std::io::{BufRead, Write};

/// Customers that have at least one rental, joined on `r.customer_id`
/// with `distinct` so each customer is listed once.
const CUSTOMERS_WITH_RENTALS: &str =
    "select distinct c.customer_id, c.first_name || ' ' || c.last_name \
     from customer c join rental r on c.customer_id = r.customer_id \
     order by c.customer_id;";

const ALL_CUSTOMERS: &str = "select c.customer_id, c.first_name || ' ' || c.last_name \
     from customer c order by c.customer_id;";

const RENTALS_FOR_CUSTOMER: &str =
    "select r.rental_id, r.rental_date, s.first_name || ' ' || s.last_name, \
     c.first_name || ' ' || c.last_name, \
     f.title || ' - ' || f.description || ' $' || f.rental_rate, \
     r.return_date \
     from rental r \
     join staff s on r.staff_id = s.staff_id \
     join customer c on r.customer_id = c.customer_id \
     join inventory i on r.inventory_id = i.inventory_id \
     join film f on i.film_id = f.film_id \
     where c.customer_id = ? \
     order by r.rental_date;";

const CUSTOMER_DETAILS: &str =
    "select c.first_name, c.last_name, a.address, a.phone, ct.city, a.postal_code, \
     c.email, c.active, c.last_update \
     from customer c join address a on c.address_id = a.address_id \
     join city ct on a.city_id = ct.city_id \
     where c.customer_id = ?;";

#[derive(Debug, Clone, PartialEq)]
pub struct CustomerSummary {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RentalRecord {
    pub rental_id: i64,
    pub rental_date: String,
    pub staff_name: String,
    pub customer_name: String,
    pub film_info: String,
    pub return_date: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CustomerDetails {
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub phone: String,
    pub city: String,
    pub postal_code: String,
    pub email: String,
    pub active: i64,
    pub last_update: String,
}

/// The two-entry Sakila main menu.
pub fn menu<R: BufRead, W: Write>() -> Menu<R, W> {
    Menu::new()
        .item("View the rentals for a customer", view_rentals_for_customer::<R, W>)
        .item("View Customer Information", view_customer_information::<R, W>)
}

pub fn customers_with_rentals(db: &Database) -> Result<Vec<CustomerSummary>> {
    let customers = db
        .collect(CUSTOMERS_WITH_RENTALS, [], customer_summary)
        .context("Error preparing customer query")?;
    Ok(customers)
}

pub fn all_customers(db: &Database) -> Result<Vec<CustomerSummary>> {
    let customers = db
        .collect(ALL_CUSTOMERS, [], customer_summary)
        .context("Error preparing customer summary query")?;
    Ok(customers)
}

pub fn rentals_for_customer(db: &Database, customer_id: i64) -> Result<Vec<RentalRecord>> {
    let rentals = db
        .collect(RENTALS_FOR_CUSTOMER, [customer_id], |row| {
            Ok(RentalRecord {
                rental_id: int_cell(row, 0)?,
                rental_date: text_cell(row, 1)?,
                staff_name: text_cell(row, 2)?,
                customer_name: text_cell(row, 3)?,
                film_info: text_cell(row, 4)?,
                return_date: text_cell(row, 5)?,
            })
        })
        .context("Error preparing rental query")?;
    Ok(rentals)
}

pub fn customer_details(db: &Database, customer_id: i64) -> Result<Option<CustomerDetails>> {
    let details = db
        .first(CUSTOMER_DETAILS, [customer_id], |row| {
            Ok(CustomerDetails {
                first_name: text_cell(row, 0)?,
                last_name: text_cell(row, 1)?,
                address: text_cell(row, 2)?,
                phone: text_cell(row, 3)?,
                city: text_cell(row, 4)?,
                postal_code: text_cell(row, 5)?,
                email: text_cell(row, 6)?,
                active: int_cell(row, 7)?,
                last_update: text_cell(row, 8)?,
            })
        })
        .context("Error fetching customer details")?;
    Ok(details)
}

fn customer_summary(row: &rusqlite::Row<'_>) -> rusqlite::Result<CustomerSummary> {
    Ok(CustomerSummary {
        id: int_cell(row, 0)?,
        name: text_cell(row, 1)?,
    })
}

fn display_customer<W: Write>(
    out: &mut W,
    customer: &CustomerSummary,
    position: usize,
) -> std::io::Result<()> {
    writeln!(out, "{}. {} - {}", position, customer.id, customer.name)
}

/// Menu action 1: pick a customer, then one of their rentals, and print it.
pub fn view_rentals_for_customer<R: BufRead, W: Write>(
    db: &Database,
    console: &mut Console<R, W>,
) -> Result<()> {
    let customers = customers_with_rentals(db)?;
    if customers.is_empty() {
        writeln!(console.out(), "No customers with rentals found.")?;
        return Ok(());
    }

    let Some(index) = browse(
        console,
        &customers,
        "Choose the customer you want to see rentals for ",
        display_customer,
    )?
    else {
        return Ok(());
    };
    let customer_id = customers[index].id;

    let rentals = rentals_for_customer(db, customer_id)?;
    if rentals.is_empty() {
        writeln!(console.out(), "No rentals found for the selected customer.")?;
        return Ok(());
    }

    let Some(index) = browse(
        console,
        &rentals,
        "Choose the rental you want to see ",
        |out, rental, position| {
            writeln!(
                out,
                "{}. {} - {}",
                position, rental.rental_id, rental.rental_date
            )
        },
    )?
    else {
        return Ok(());
    };

    print_rental(console.out(), &rentals[index])?;
    Ok(())
}

/// Menu action 2: pick a customer and print their address card.
pub fn view_customer_information<R: BufRead, W: Write>(
    db: &Database,
    console: &mut Console<R, W>,
) -> Result<()> {
    let customers = all_customers(db)?;
    if customers.is_empty() {
        writeln!(console.out(), "No customers found in the database.")?;
        return Ok(());
    }

    let Some(index) = browse(
        console,
        &customers,
        "Choose the customer you want to see: ",
        display_customer,
    )?
    else {
        return Ok(());
    };
    let customer_id = customers[index].id;

    writeln!(console.out(), "Executing query for customer ID: {}", customer_id)?;
    match customer_details(db, customer_id)? {
        Some(details) => {
            writeln!(console.out(), "Customer details found!")?;
            print_customer(console.out(), &details)?;
        }
        None => writeln!(
            console.out(),
            "No customer details found for the selected id."
        )?,
    }
    Ok(())
}

fn print_rental<W: Write>(out: &mut W, rental: &RentalRecord) -> std::io::Result<()> {
    writeln!(out, "\n**********Rental Date: {}**********", rental.rental_date)?;
    writeln!(out, "Staff: {}", rental.staff_name)?;
    writeln!(out, "Customer: {}", rental.customer_name)?;
    writeln!(out, "Film Information:")?;
    writeln!(out, "{}", rental.film_info)?;
    writeln!(out, "Return Date: {}", rental.return_date)
}

fn print_customer<W: Write>(out: &mut W, details: &CustomerDetails) -> std::io::Result<()> {
    writeln!(out, "\n**********Customer Information**********")?;
    writeln!(out, "Name: {} {}", details.first_name, details.last_name)?;
    writeln!(out, "Address: {}", details.address)?;
    writeln!(out, "{}, {}", details.city, details.postal_code)?;
    writeln!(out, "Phone Number: {}", details.phone)?;
    writeln!(out, "Email: {}", details.email)?;
    writeln!(out, "Active: {}", details.active)?;
    writeln!(out, "Last Update: {}", details.last_update)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_print_rental_block() {
        let rental = RentalRecord {
            rental_id: 76,
            rental_date: "2005-05-25 11:30:37".to_string(),
            staff_name: "Mike Hillyer".to_string(),
            customer_name: "MARY SMITH".to_string(),
            film_info: "ACADEMY DINOSAUR - An epic drama $0.99".to_string(),
            return_date: String::new(),
        };
        let mut out = Vec::new();
        print_rental(&mut out, &rental).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "\n**********Rental Date: 2005-05-25 11:30:37**********\n\
             Staff: Mike Hillyer\n\
             Customer: MARY SMITH\n\
             Film Information:\n\
             ACADEMY DINOSAUR - An epic drama $0.99\n\
             Return Date: \n"
        );
    }

    #[test]
    fn test_print_customer_block() {
        let details = CustomerDetails {
            first_name: "MARY".to_string(),
            last_name: "SMITH".to_string(),
            address: "1913 Hanoi Way".to_string(),
            phone: "28303384290".to_string(),
            city: "Sasebo".to_string(),
            postal_code: "35200".to_string(),
            email: "MARY.SMITH@sakilacustomer.org".to_string(),
            active: 1,
            last_update: "2006-02-15 04:57:20".to_string(),
        };
        let mut out = Vec::new();
        print_customer(&mut out, &details).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("\n**********Customer Information**********\nName: MARY SMITH\n"));
        assert!(text.contains("Sasebo, 35200\n"));
        assert!(text.contains("Active: 1\n"));
    }

    #[test]
    fn test_display_customer_line() {
        let mut out = Vec::new();
        let customer = CustomerSummary {
            id: 5,
            name: "ELIZABETH BROWN".to_string(),
        };
        display_customer(&mut out, &customer, 3).unwrap();
        assert_eq!(out, b"3. 5 - ELIZABETH BROWN\n".to_vec());
    }

    #[test]
    fn test_menu_labels() {
        let menu: Menu<std::io::Cursor<Vec<u8>>, Vec<u8>> = menu();
        assert_eq!(
            menu.labels(),
            vec!["View the rentals for a customer", "View Customer Information"]
        );
    }
}

//! Built-in training corpus for the financial database: schema DDL,
//! table documentation, and question/SQL exemplars. Data, not logic.

use super::{Corpus, DdlEntry, DocEntry, SqlExample};

const DDL_STATEMENTS: [&str; 8] = [
    r#"CREATE TABLE `account` (
  `account_id` INT,
  `district_id` INT,
  `frequency` TEXT,
  `date` DATE
);"#,
    r#"CREATE TABLE `card` (
  `card_id` INT,
  `disp_id` INT,
  `type` TEXT,
  `issued` DATE
);"#,
    r#"CREATE TABLE `client` (
  `client_id` INT,
  `gender` TEXT,
  `birth_date` DATE,
  `district_id` INT
);"#,
    r#"CREATE TABLE `disp` (
  `disp_id` INT,
  `client_id` INT,
  `account_id` INT,
  `type` TEXT
);"#,
    r#"CREATE TABLE `district` (
  `district_id` INT,
  `A2` TEXT,
  `A3` TEXT,
  `A4` TEXT,
  `A5` TEXT,
  `A6` TEXT,
  `A7` TEXT,
  `A8` INT,
  `A9` INT,
  `A10` REAL,
  `A11` INT,
  `A12` REAL,
  `A13` REAL,
  `A14` INT,
  `A15` INT,
  `A16` INT
);"#,
    r#"CREATE TABLE `loan` (
  `loan_id` INT,
  `account_id` INT,
  `date` DATE,
  `amount` INT,
  `duration` INT,
  `payments` REAL,
  `status` TEXT
);"#,
    r#"CREATE TABLE `order` (
  `order_id` INT,
  `account_id` INT,
  `bank_to` TEXT,
  `account_to` INT,
  `amount` REAL,
  `k_symbol` TEXT
);"#,
    r#"CREATE TABLE `trans` (
  `trans_id` INT,
  `account_id` INT,
  `date` DATE,
  `type` TEXT,
  `operation` TEXT,
  `amount` INT,
  `balance` INT,
  `k_symbol` TEXT,
  `bank` TEXT,
  `account` INT
);"#,
];

const DOCUMENTATION: [&str; 8] = [
    r#"Table `account`: Contains information about each account, including its creation date, location, and frequency of statement issuance. This table holds the primary details for each bank account.
Columns:
- `account_id`: The unique ID of the account.
- `district_id`: The ID for the location of the branch, foreign key to the district table.
- `frequency`: Frequency of statement issuance. Values are: 'POPLATEK MESICNE' (monthly issuance), 'POPLATEK TYDNE' (weekly issuance), 'POPLATEK PO OBRATU' (issuance after transaction).
- `date`: The creation date of the account in YYMMDD format."#,
    r#"Table `card`: Details about credit cards issued to clients. This table lists all credit cards associated with dispositions.
Columns:
- `card_id`: The unique ID number of the credit card.
- `disp_id`: The disposition ID, foreign key to the disp table.
- `type`: The type of credit card. Values are: 'junior' (junior class), 'classic' (standard class), 'gold' (high-level class).
- `issued`: The date when the credit card was issued in YYMMDD format."#,
    r#"Table `client`: Contains personal demographic information about the bank's clients.
Columns:
- `client_id`: The unique ID number for the client.
- `gender`: The gender of the client. Values are: 'F' (female), 'M' (male).
- `birth_date`: The birth date of the client in YYMMDD format.
- `district_id`: The ID for the location of the client's branch, foreign key to the district table."#,
    r#"Table `disp`: Links clients to their accounts and specifies their rights. This table acts as a mapping between clients and accounts.
Columns:
- `disp_id`: A unique ID for the disposition record.
- `client_id`: The ID of the client, foreign key to the client table.
- `account_id`: The ID of the account, foreign key to the account table.
- `type`: The type of disposition or role of the client for that account. Values are: 'OWNER' (the account owner), 'DISPONENT' (a user with rights to the account)."#,
    r#"Table `district`: Provides demographic and economic statistics for different geographic districts.
Columns:
- `district_id`: The unique ID for the district.
- `A2`: The name of the district (district_name).
- `A3`: The region the district belongs to.
- `A4`: The number of inhabitants in the district.
- `A5`: Number of municipalities with inhabitants < 499.
- `A6`: Number of municipalities with inhabitants 500-1999.
- `A7`: Number of municipalities with inhabitants 2000-9999.
- `A8`: Number of municipalities with inhabitants > 10000.
- `A9`: Number of cities.
- `A10`: The ratio of urban inhabitants.
- `A11`: The average salary in the district.
- `A12`: The unemployment rate in 1995.
- `A13`: The unemployment rate in 1996.
- `A14`: The number of entrepreneurs per 1000 inhabitants.
- `A15`: The number of committed crimes in 1995.
- `A16`: The number of committed crimes in 1996."#,
    r#"Table `loan`: Contains information about approved loans for accounts.
Columns:
- `loan_id`: The unique ID for the loan.
- `account_id`: The ID of the account the loan is associated with, foreign key to the account table.
- `date`: The date the loan was approved in YYMMDD format.
- `amount`: The approved loan amount in USD.
- `duration`: The loan duration in months.
- `payments`: The monthly payment amount in USD.
- `status`: The repayment status of the loan. Values are: 'A' (contract finished, no problems), 'B' (contract finished, loan not paid), 'C' (running contract, OK so far), 'D' (running contract, client in debt)."#,
    r#"Table `order`: Contains information about permanent (standing) orders from accounts.
Columns:
- `order_id`: The unique ID for the standing order.
- `account_id`: The ID of the account the order is from, foreign key to the account table.
- `bank_to`: The bank of the recipient.
- `account_to`: The account number of the recipient.
- `amount`: The debited amount.
- `k_symbol`: A characterization of the payment's purpose. Values are: 'POJISTNE' (insurance payment), 'SIPO' (household payment), 'LEASING' (leasing payment), 'UVER' (loan payment)."#,
    r#"Table `trans`: Records all transactions for accounts, providing a detailed log.
Columns:
- `trans_id`: The unique ID for the transaction.
- `account_id`: The ID of the account for the transaction, foreign key to the account table.
- `date`: The date of the transaction in YYMMDD format.
- `type`: The type of transaction. Values are: 'PRIJEM' (credit/income), 'VYDAJ' (withdrawal/expenditure).
- `operation`: The mode of the transaction. Values include: 'VYBER KARTOU' (credit card withdrawal), 'VKLAD' (credit in cash), 'PREVOD Z UCTU' (collection from another bank), 'VYBER' (withdrawal in cash), 'PREVOD NA UCET' (remittance to another bank).
- `amount`: The amount of money in USD for the transaction.
- `balance`: The account balance after the transaction in USD.
- `k_symbol`: A characterization of the transaction's purpose. Values include: 'POJISTNE' (insurance payment), 'SLUZBY' (payment for a service), 'UROK' (interest credited), 'SANKC. UROK' (sanction interest for negative balance), 'SIPO' (household payment), 'DUCHOD' (pension), 'UVER' (loan payment).
- `bank`: The bank of the transaction partner.
- `account`: The account of the transaction partner."#,
];

const EXAMPLES: [(&str, &str); 49] = [
    // Simple lookups and aggregates
    (
        "How many total clients does the bank have?",
        "SELECT COUNT(client_id) FROM client;",
    ),
    (
        "What are the different types of credit cards the bank offers?",
        "SELECT DISTINCT type FROM card;",
    ),
    (
        "Show me the total number of accounts for each statement frequency.",
        "SELECT frequency, COUNT(account_id) as num_accounts FROM account GROUP BY frequency;",
    ),
    (
        "Which 10 districts have the highest average salary?",
        "SELECT A2 as district_name, A11 as average_salary FROM district ORDER BY A11 DESC LIMIT 10;",
    ),
    (
        "What is the total loan amount for each loan status?",
        "SELECT status, SUM(amount) as total_loan_amount FROM loan GROUP BY status;",
    ),
    (
        "How many gold cards have been issued?",
        "SELECT COUNT(card_id) FROM card WHERE type = 'gold';",
    ),
    (
        "What is the total number of transactions recorded?",
        "SELECT COUNT(trans_id) FROM trans;",
    ),
    (
        "What is the average loan amount?",
        "SELECT AVG(amount) FROM loan;",
    ),
    (
        "List all accounts created in 1997.",
        "SELECT account_id, date FROM account WHERE SUBSTR(date, 1, 2) = '97';",
    ),
    (
        "What are the different transaction operations available?",
        "SELECT DISTINCT operation FROM trans;",
    ),
    (
        "How many male vs female clients are there?",
        "SELECT gender, COUNT(client_id) FROM client GROUP BY gender;",
    ),
    (
        "What are the different payment characterizations (k_symbol) for standing orders?",
        "SELECT DISTINCT k_symbol FROM `order`;",
    ),
    (
        "Find the 5 largest loans by amount.",
        "SELECT loan_id, amount FROM loan ORDER BY amount DESC LIMIT 5;",
    ),
    (
        "How many accounts are in district with ID 1?",
        "SELECT COUNT(account_id) FROM account WHERE district_id = 1;",
    ),
    (
        "What are the different regions listed in the district table?",
        "SELECT DISTINCT A3 FROM district;",
    ),
    // Joins across the client/account/card relations
    (
        "How many 'gold' credit cards are held by female clients?",
        r#"SELECT COUNT(ca.card_id)
FROM client cl
JOIN disp d ON cl.client_id = d.client_id
JOIN card ca ON d.disp_id = ca.disp_id
WHERE cl.gender = 'F' AND ca.type = 'gold';"#,
    ),
    (
        "What is the total transaction amount for accounts located in the 'Prague' district?",
        r#"SELECT SUM(t.amount)
FROM trans t
JOIN account a ON t.account_id = a.account_id
JOIN district d ON a.district_id = d.district_id
WHERE d.A2 = 'Prague';"#,
    ),
    (
        "List the client IDs and birth dates for clients who own an account with monthly statement issuance.",
        r#"SELECT c.client_id, c.birth_date
FROM client c
JOIN disp d ON c.client_id = d.client_id
JOIN account a ON d.account_id = a.account_id
WHERE a.frequency = 'POPLATEK MESICNE' AND d.type = 'OWNER';"#,
    ),
    (
        "Find all clients who have a loan but do not have a credit card.",
        r#"SELECT DISTINCT c.client_id
FROM client c
JOIN disp d ON c.client_id = d.client_id
WHERE d.account_id IN (SELECT account_id FROM loan)
  AND d.disp_id NOT IN (SELECT disp_id FROM card);"#,
    ),
    (
        "What is the average loan amount for male clients living in a region with an unemployment rate in 1996 (A13) higher than 5%?",
        r#"SELECT AVG(l.amount)
FROM loan l
JOIN account a ON l.account_id = a.account_id
JOIN disp d ON a.account_id = d.account_id
JOIN client c ON d.client_id = c.client_id
JOIN district di ON c.district_id = di.district_id
WHERE c.gender = 'M' AND di.A13 > 5.0;"#,
    ),
    (
        "Which district has the highest number of bank accounts?",
        r#"SELECT d.A2 as district_name, COUNT(a.account_id) as num_accounts
FROM district d
JOIN account a ON d.district_id = a.district_id
GROUP BY d.A2
ORDER BY num_accounts DESC
LIMIT 1;"#,
    ),
    (
        "List clients who are owners of more than one account.",
        r#"SELECT c.client_id
FROM client c
JOIN disp d ON c.client_id = d.client_id
WHERE d.type = 'OWNER'
GROUP BY c.client_id
HAVING COUNT(d.account_id) > 1;"#,
    ),
    (
        "What is the total amount of loans given to clients in each region?",
        r#"SELECT di.A3 as region, SUM(l.amount) as total_loan_amount
FROM loan l
JOIN account a ON l.account_id = a.account_id
JOIN district di ON a.district_id = di.district_id
GROUP BY di.A3;"#,
    ),
    (
        "Find the number of transactions for each type of credit card.",
        r#"SELECT ca.type, COUNT(t.trans_id) as num_transactions
FROM trans t
JOIN account a ON t.account_id = a.account_id
JOIN disp d ON a.account_id = d.account_id
JOIN card ca ON d.disp_id = ca.disp_id
GROUP BY ca.type;"#,
    ),
    (
        "List all standing orders for household payments ('SIPO') that are greater than the average household payment amount.",
        r#"SELECT * FROM `order`
WHERE k_symbol = 'SIPO'
  AND amount > (SELECT AVG(amount) FROM `order` WHERE k_symbol = 'SIPO');"#,
    ),
    (
        "Show me the total transaction amount for each district.",
        r#"SELECT
  d.A2,
  SUM(t.amount)
FROM district AS d
JOIN account AS a ON d.district_id = a.district_id
JOIN trans AS t ON a.account_id = t.account_id
GROUP BY
  d.A2"#,
    ),
    // Window functions and multi-step analyses
    (
        "For each district, find the client who made the single largest transaction and show that transaction amount.",
        r#"WITH RankedTransactions AS (
    SELECT
        d.A2 as district_name,
        c.client_id,
        t.amount,
        RANK() OVER(PARTITION BY d.A2 ORDER BY t.amount DESC) as rn
    FROM trans t
    JOIN account a ON t.account_id = a.account_id
    JOIN disp di ON a.account_id = di.account_id
    JOIN client c ON di.client_id = c.client_id
    JOIN district d ON a.district_id = d.district_id
)
SELECT district_name, client_id, amount
FROM RankedTransactions
WHERE rn = 1;"#,
    ),
    (
        "Calculate the month-over-month growth rate of the total withdrawal ('VYDAJ') transaction volume.",
        r#"WITH MonthlyVolume AS (
    SELECT
        STRFTIME('%Y-%m', date) as transaction_month,
        SUM(amount) as total_volume
    FROM trans
    WHERE type = 'VYDAJ'
    GROUP BY transaction_month
)
SELECT
    transaction_month,
    total_volume,
    (total_volume - LAG(total_volume, 1, 0) OVER (ORDER BY transaction_month)) * 100.0 / LAG(total_volume, 1, 0) OVER (ORDER BY transaction_month) as growth_percentage
FROM MonthlyVolume
WHERE LAG(total_volume, 1, 0) OVER (ORDER BY transaction_month) > 0;"#,
    ),
    (
        "Find the average number of days between a client's account creation and them taking out their first loan.",
        r#"WITH FirstLoan AS (
    SELECT
        account_id,
        MIN(date) as first_loan_date
    FROM loan
    GROUP BY account_id
)
SELECT
    AVG(JULIANDAY(fl.first_loan_date) - JULIANDAY(a.date)) as avg_days_to_first_loan
FROM account a
JOIN FirstLoan fl ON a.account_id = fl.account_id;"#,
    ),
    (
        "List the top 3 districts by the ratio of total loan amount to the number of inhabitants.",
        r#"WITH DistrictLoanSummary AS (
    SELECT
        d.district_id,
        d.A2 as district_name,
        CAST(d.A4 AS INTEGER) as inhabitants,
        SUM(l.amount) as total_loan_amount
    FROM district d
    JOIN account a ON d.district_id = a.district_id
    JOIN loan l ON a.account_id = l.account_id
    GROUP BY d.district_id, d.A2, d.A4
)
SELECT
    district_name,
    total_loan_amount,
    inhabitants,
    (total_loan_amount * 1.0 / inhabitants) as loan_per_capita
FROM DistrictLoanSummary
ORDER BY loan_per_capita DESC
LIMIT 3;"#,
    ),
    (
        "Identify clients who have a 'gold' card and have an average transaction balance greater than the overall average transaction balance for all gold card holders.",
        r#"WITH GoldCardHolders AS (
    SELECT d.client_id
    FROM card c
    JOIN disp d ON c.disp_id = d.disp_id
    WHERE c.type = 'gold'
),
OverallGoldAvgBalance AS (
    SELECT AVG(t.balance) as avg_balance
    FROM trans t
    JOIN disp d ON t.account_id = d.account_id
    WHERE d.client_id IN (SELECT client_id FROM GoldCardHolders)
),
ClientAvgBalance AS (
    SELECT
        d.client_id,
        AVG(t.balance) as avg_client_balance
    FROM trans t
    JOIN disp d ON t.account_id = d.account_id
    WHERE d.client_id IN (SELECT client_id FROM GoldCardHolders)
    GROUP BY d.client_id
)
SELECT cab.client_id
FROM ClientAvgBalance cab
CROSS JOIN OverallGoldAvgBalance oab
WHERE cab.avg_client_balance > oab.avg_balance;"#,
    ),
    (
        "For each region, what is the percentage of accounts that have taken out a loan?",
        r#"SELECT
    d.A3 as region,
    COUNT(DISTINCT l.account_id) * 100.0 / COUNT(DISTINCT a.account_id) as percentage_with_loan
FROM district d
LEFT JOIN account a ON d.district_id = a.district_id
LEFT JOIN loan l ON a.account_id = l.account_id
GROUP BY d.A3;"#,
    ),
    (
        "Find the running total of transaction amounts for each account, ordered by date.",
        r#"SELECT
    account_id,
    date,
    amount,
    SUM(amount) OVER (PARTITION BY account_id ORDER BY date) as running_total
FROM trans
ORDER BY account_id, date;"#,
    ),
    (
        "Which clients have had a transaction every single month of 1997?",
        r#"WITH ClientMonthlyTransactions AS (
    SELECT
        d.client_id,
        STRFTIME('%Y-%m', t.date) as transaction_month
    FROM trans t
    JOIN disp d ON t.account_id = d.account_id
    WHERE STRFTIME('%Y', t.date) = '1997'
    GROUP BY d.client_id, transaction_month
)
SELECT client_id
FROM ClientMonthlyTransactions
GROUP BY client_id
HAVING COUNT(transaction_month) = 12;"#,
    ),
    (
        "Who is the owner of the account with the largest loan amount?",
        r#"SELECT
  c.client_id
FROM client AS c
JOIN disp AS d ON c.client_id = d.client_id
JOIN loan AS l ON d.account_id = l.account_id
WHERE
  d.type = 'OWNER'
ORDER BY
  l.amount DESC
LIMIT 1;"#,
    ),
    (
        "What is the gender of the oldest client who opened his/her account in the 'Prague' district?",
        r#"SELECT
  c.gender
FROM client AS c
JOIN disp AS d ON c.client_id = d.client_id
JOIN account AS a ON d.account_id = a.account_id
JOIN district AS dist ON a.district_id = dist.district_id
WHERE
  dist.A2 = 'Prague'
ORDER BY
  c.birth_date ASC
LIMIT 1;"#,
    ),
    (
        "List the account numbers of clients from 'East Bohemia' who have a running loan contract.",
        r#"SELECT
  a.account_id
FROM account AS a
JOIN district AS dist ON a.district_id = dist.district_id
JOIN loan AS l ON a.account_id = l.account_id
WHERE
  dist.A3 = 'East Bohemia' AND l.status IN ('C', 'D');"#,
    ),
    (
        "How many female clients opened their accounts in the 'Jesenik' district?",
        r#"SELECT
  COUNT(c.client_id)
FROM client AS c
JOIN disp AS d ON c.client_id = d.client_id
JOIN account AS a ON d.account_id = a.account_id
JOIN district AS dist ON a.district_id = dist.district_id
WHERE
  c.gender = 'F' AND dist.A2 = 'Jesenik';"#,
    ),
    (
        "Who placed the order with the id 32423?",
        r#"SELECT
  c.client_id
FROM client AS c
JOIN disp AS d ON c.client_id = d.client_id
JOIN `order` AS o ON d.account_id = o.account_id
WHERE
  o.order_id = 32423 AND d.type = 'OWNER';"#,
    ),
    (
        "What is the region of the client with the id 3541 from?",
        r#"SELECT
  d.A3
FROM district AS d
JOIN client AS c ON d.district_id = c.district_id
WHERE
  c.client_id = 3541;"#,
    ),
    (
        "How much is the average amount in credit card transactions made by account holders in the year 2021?",
        r#"SELECT
  AVG(t.amount)
FROM trans AS t
JOIN disp AS d ON t.account_id = d.account_id
JOIN card AS c ON d.disp_id = c.disp_id
WHERE
  STRFTIME('%Y', t.date) = '2021' AND t.operation = 'VYBER KARTOU';"#,
    ),
    (
        "List the account numbers of female clients who are oldest and have the lowest average salary in their district.",
        r#"SELECT
  a.account_id
FROM account AS a
JOIN client AS c ON a.district_id = c.district_id
JOIN district AS d ON a.district_id = d.district_id
JOIN disp ON c.client_id = disp.client_id AND a.account_id = disp.account_id
WHERE
  c.gender = 'F' AND disp.type = 'OWNER'
ORDER BY
  c.birth_date ASC, d.A11 ASC
LIMIT 1;"#,
    ),
    (
        "How many accounts in 'North Bohemia' have made a transaction with the partner's bank being 'AB'?",
        r#"SELECT
  COUNT(DISTINCT a.account_id)
FROM account AS a
JOIN district AS d ON a.district_id = d.district_id
JOIN trans AS t ON a.account_id = t.account_id
WHERE
  d.A3 = 'North Bohemia' AND t.bank = 'AB';"#,
    ),
    // Short single-table aggregates
    (
        "How many junior cards have been issued?",
        "SELECT COUNT(card_id) FROM card WHERE type = 'junior';",
    ),
    (
        "What is the largest single transaction amount recorded?",
        "SELECT MAX(amount) FROM trans;",
    ),
    (
        "How many loans are currently in debt status?",
        "SELECT COUNT(loan_id) FROM loan WHERE status = 'D';",
    ),
    (
        "What is the average monthly loan payment?",
        "SELECT AVG(payments) FROM loan;",
    ),
    (
        "How many standing orders are loan payments?",
        "SELECT COUNT(order_id) FROM `order` WHERE k_symbol = 'UVER';",
    ),
    (
        "List the 5 districts with the most committed crimes in 1996.",
        "SELECT A2 as district_name, A16 as crimes_1996 FROM district ORDER BY A16 DESC LIMIT 5;",
    ),
];

/// The full seed corpus for the financial database.
pub fn builtin() -> Corpus {
    Corpus {
        ddl: DDL_STATEMENTS
            .iter()
            .map(|s| DdlEntry {
                statement: (*s).to_string(),
            })
            .collect(),
        docs: DOCUMENTATION
            .iter()
            .map(|s| DocEntry {
                text: (*s).to_string(),
            })
            .collect(),
        examples: EXAMPLES
            .iter()
            .map(|(question, sql)| SqlExample {
                question: (*question).to_string(),
                sql: (*sql).to_string(),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corpus_covers_all_collections() {
        let corpus = builtin();
        assert_eq!(corpus.ddl.len(), 8);
        assert_eq!(corpus.docs.len(), 8);
        assert_eq!(corpus.examples.len(), 49);
    }

    #[test]
    fn every_example_has_question_and_sql() {
        for example in builtin().examples {
            assert!(!example.question.trim().is_empty());
            assert!(!example.sql.trim().is_empty());
        }
    }
}

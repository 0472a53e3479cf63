mod enroll_test;

//! Example program catalog
//!
//! Static, read-only mapping of example names to source text, served to
//! clients as starting points. No computation here.

const HELLO_WORLD: &str = r#"#include <stdio.h>
#include <omp.h>

int main() {
    #pragma omp parallel
    {
        int thread_id = omp_get_thread_num();
        int total_threads = omp_get_num_threads();
        printf("Hello from thread %d of %d\n", thread_id, total_threads);
    }
    return 0;
}"#;

const ARRAY_SUM: &str = r#"#include <stdio.h>
#include <omp.h>

int main() {
    int n = 1000;
    int arr[1000];
    int sum = 0;

    // Initialize array
    for (int i = 0; i < n; i++) {
        arr[i] = i + 1;
    }

    // Parallel sum using reduction
    #pragma omp parallel for reduction(+:sum)
    for (int i = 0; i < n; i++) {
        sum += arr[i];
    }

    printf("Sum of 1 to %d = %d\n", n, sum);
    printf("Expected: %d\n", (n * (n + 1)) / 2);
    return 0;
}"#;

const PRIVATE_VS_SHARED: &str = r#"#include <stdio.h>
#include <omp.h>

int main() {
    int shared_var = 0;
    int private_var = 100;

    printf("Before parallel region:\n");
    printf("shared_var = %d, private_var = %d\n\n", shared_var, private_var);

    #pragma omp parallel num_threads(4) private(private_var) shared(shared_var)
    {
        int tid = omp_get_thread_num();
        private_var = tid * 10;  // Each thread has its own copy

        #pragma omp critical
        {
            shared_var += tid;  // All threads share this variable
            printf("Thread %d: private_var = %d, shared_var = %d\n",
                   tid, private_var, shared_var);
        }
    }

    printf("\nAfter parallel region:\n");
    printf("shared_var = %d, private_var = %d\n", shared_var, private_var);
    return 0;
}"#;

const CRITICAL_SECTION: &str = r#"#include <stdio.h>
#include <omp.h>

int main() {
    int counter = 0;

    printf("Without critical section (race condition):\n");
    #pragma omp parallel for num_threads(4)
    for (int i = 0; i < 1000; i++) {
        counter++;  // Race condition!
    }
    printf("Counter = %d (should be 1000)\n\n", counter);

    counter = 0;
    printf("With critical section:\n");
    #pragma omp parallel for num_threads(4)
    for (int i = 0; i < 1000; i++) {
        #pragma omp critical
        counter++;
    }
    printf("Counter = %d (correct!)\n", counter);
    return 0;
}"#;

const MPI_HELLO: &str = r#"#include <mpi.h>
#include <stdio.h>

int main(int argc, char **argv) {
    MPI_Init(&argc, &argv);
    int rank = 0;
    int size = 0;
    MPI_Comm_rank(MPI_COMM_WORLD, &rank);
    MPI_Comm_size(MPI_COMM_WORLD, &size);
    printf("Hello from rank %d of %d\n", rank, size);
    MPI_Finalize();
    return 0;
}"#;

const CPP_HELLO: &str = r#"#include <iostream>
#include <omp.h>

int main() {
    #pragma omp parallel
    {
        int thread_id = omp_get_thread_num();
        int total_threads = omp_get_num_threads();
        #pragma omp critical
        std::cout << "Hello from thread " << thread_id << " of " << total_threads << std::endl;
    }
    return 0;
}"#;

const CPP_VECTOR: &str = r#"#include <iostream>
#include <vector>
#include <omp.h>

int main() {
    std::vector<int> arr(1000);
    long long sum = 0;

    // Initialize array
    for (int i = 0; i < 1000; i++) {
        arr[i] = i + 1;
    }

    // Parallel sum using reduction
    #pragma omp parallel for reduction(+:sum)
    for (int i = 0; i < 1000; i++) {
        sum += arr[i];
    }

    std::cout << "Sum of 1 to 1000 = " << sum << std::endl;
    std::cout << "Expected: " << (1000 * 1001) / 2 << std::endl;
    return 0;
}"#;

const MPI_CPP_HELLO: &str = r#"#include <mpi.h>
#include <iostream>

int main(int argc, char **argv) {
    MPI_Init(&argc, &argv);
    int rank, size;
    MPI_Comm_rank(MPI_COMM_WORLD, &rank);
    MPI_Comm_size(MPI_COMM_WORLD, &size);
    std::cout << "Hello from rank " << rank << " of " << size << std::endl;
    MPI_Finalize();
    return 0;
}"#;

/// All example programs, in stable (sorted) order
pub fn examples() -> &'static [(&'static str, &'static str)] {
    &[
        ("array_sum", ARRAY_SUM),
        ("cpp_hello", CPP_HELLO),
        ("cpp_vector", CPP_VECTOR),
        ("critical_section", CRITICAL_SECTION),
        ("hello_world", HELLO_WORLD),
        ("mpi_cpp_hello", MPI_CPP_HELLO),
        ("mpi_hello", MPI_HELLO),
        ("private_vs_shared", PRIVATE_VS_SHARED),
    ]
}

/// Look up an example by name
pub fn get(name: &str) -> Option<&'static str> {
    examples()
        .iter()
        .find(|(key, _)| *key == name)
        .map(|(_, source)| *source)
}
